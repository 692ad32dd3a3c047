pub mod family_model;
pub mod flat_model;

pub use family_model::FamilyModel;
pub use flat_model::TableModel;
