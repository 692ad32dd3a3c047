//! Table projection of family records.
//!
//! Pure read adapter: a fixed ordered column table and an independent sort
//! key table over [`Family`] rows, with no mutable state beyond the
//! database handle and the precomputed function tables. `destroy` drops
//! all of them so a closed view holds nothing alive.

use archive::{ArchiveDb, Event, Family, Person, Tag};
use chrono::{TimeZone, Utc};
use core_types::{EventKind, EventRole};
use tracing::warn;

use crate::views::flat_model::TableModel;

type ColumnFn<'a> = fn(&FamilyModel<'a>, &Family) -> Option<String>;
type SortFn<'a> = fn(&FamilyModel<'a>, &Family) -> String;

pub struct FamilyModel<'a> {
    db: Option<&'a ArchiveDb>,
    invalid_date_format: String,
    fmap: Vec<ColumnFn<'a>>,
    smap: Vec<SortFn<'a>>,
}

impl<'a> FamilyModel<'a> {
    pub fn new(db: &'a ArchiveDb, invalid_date_format: impl Into<String>) -> Self {
        Self {
            db: Some(db),
            invalid_date_format: invalid_date_format.into(),
            fmap: vec![
                Self::column_id,
                Self::column_father,
                Self::column_mother,
                Self::column_type,
                Self::column_marriage,
                Self::column_tags,
                Self::column_change,
                Self::column_handle,
                Self::column_tag_color,
                Self::column_tooltip,
            ],
            smap: vec![
                Self::sort_id,
                Self::sort_father,
                Self::sort_mother,
                Self::sort_type,
                Self::sort_marriage,
                Self::sort_tags,
                Self::sort_change,
                Self::sort_handle,
                Self::sort_tag_color,
                Self::sort_tooltip,
            ],
        }
    }

    /// Unset everything that could keep the archive alive after the view
    /// is torn down.
    pub fn destroy(&mut self) {
        self.db = None;
        self.fmap.clear();
        self.smap.clear();
    }

    pub fn rows(&self) -> archive::Result<Vec<Family>> {
        match self.db {
            Some(db) => Family::load_all(db).map_err(archive::ArchiveError::Store),
            None => Ok(Vec::new()),
        }
    }

    /// Rows ordered by one column's sort keys. Stable, so equal keys keep
    /// their stored order.
    pub fn sorted_rows(&self, col: usize, ascending: bool) -> archive::Result<Vec<Family>> {
        let mut rows = self.rows()?;
        rows.sort_by_cached_key(|row| self.sort_key(row, col));
        if !ascending {
            rows.reverse();
        }
        Ok(rows)
    }

    fn column_handle(&self, data: &Family) -> Option<String> {
        Some(data.handle.clone())
    }

    fn column_id(&self, data: &Family) -> Option<String> {
        Some(data.id.clone())
    }

    fn parent(&self, handle: Option<&String>) -> Option<Person> {
        let db = self.db?;
        let handle = handle?;
        match Person::find(db, handle) {
            Ok(person) => person,
            Err(err) => {
                warn!(handle = %handle, error = %err, "parent lookup failed");
                None
            }
        }
    }

    fn column_father(&self, data: &Family) -> Option<String> {
        Some(
            self.parent(data.father_handle.as_ref())
                .map(|p| p.name.display())
                .unwrap_or_default(),
        )
    }

    fn sort_father(&self, data: &Family) -> String {
        self.parent(data.father_handle.as_ref())
            .map(|p| p.name.sort_string())
            .unwrap_or_default()
    }

    fn column_mother(&self, data: &Family) -> Option<String> {
        Some(
            self.parent(data.mother_handle.as_ref())
                .map(|p| p.name.display())
                .unwrap_or_default(),
        )
    }

    fn sort_mother(&self, data: &Family) -> String {
        self.parent(data.mother_handle.as_ref())
            .map(|p| p.name.sort_string())
            .unwrap_or_default()
    }

    fn column_type(&self, data: &Family) -> Option<String> {
        Some(data.rel_type.label().to_string())
    }

    /// The family's marriage event, or a stand-in (engagement, banns,
    /// contract) when no marriage was recorded. The flag says whether the
    /// result is such a stand-in.
    fn marriage_or_fallback(&self, data: &Family) -> Option<(Event, bool)> {
        let db = self.db?;
        let mut fallback = None;
        for event_ref in &data.event_refs {
            if event_ref.role != EventRole::Family {
                continue;
            }
            let event = match Event::find(db, &event_ref.event_handle) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => {
                    warn!(handle = %event_ref.event_handle, error = %err, "event lookup failed");
                    continue;
                }
            };
            if event.kind == EventKind::Marriage {
                return Some((event, false));
            }
            if fallback.is_none() && event.kind.is_marriage_fallback() {
                fallback = Some(event);
            }
        }
        fallback.map(|event| (event, true))
    }

    fn column_marriage(&self, data: &Family) -> Option<String> {
        let Some((event, synthesized)) = self.marriage_or_fallback(data) else {
            return Some(String::new());
        };
        let Some(date) = event.date else {
            return Some(String::new());
        };
        let text = date.display();
        if synthesized {
            Some(format!("<i>{text}</i>"))
        } else if !date.is_valid() {
            Some(self.invalid_date_format.replace("{}", &text))
        } else {
            Some(text)
        }
    }

    fn sort_marriage(&self, data: &Family) -> String {
        match self.marriage_or_fallback(data) {
            Some((event, _)) => {
                let value = event.date.map(|d| d.sort_value()).unwrap_or(0);
                format!("{value:09}")
            }
            None => String::new(),
        }
    }

    fn tag_list(&self, data: &Family) -> Vec<Tag> {
        let Some(db) = self.db else {
            return Vec::new();
        };
        let mut tags = Vec::new();
        for handle in &data.tags {
            match Tag::find(db, handle) {
                Ok(Some(tag)) => tags.push(tag),
                Ok(None) => {}
                Err(err) => {
                    warn!(handle = %handle, error = %err, "tag lookup failed");
                }
            }
        }
        tags
    }

    fn column_tags(&self, data: &Family) -> Option<String> {
        let mut names: Vec<String> = self.tag_list(data).into_iter().map(|t| t.name).collect();
        names.sort_by_key(|name| name.to_lowercase());
        Some(names.join(", "))
    }

    fn sort_tags(&self, data: &Family) -> String {
        self.column_tags(data).unwrap_or_default()
    }

    /// Representative tag color: the tag with the numerically smallest
    /// priority wins; the first tag in stored order wins ties. Unset when
    /// the family has no tags.
    fn column_tag_color(&self, data: &Family) -> Option<String> {
        let mut color = None;
        let mut best_priority = None;
        for tag in self.tag_list(data) {
            if best_priority.map_or(true, |p| tag.priority < p) {
                best_priority = Some(tag.priority);
                color = Some(tag.color);
            }
        }
        color
    }

    fn column_change(&self, data: &Family) -> Option<String> {
        let formatted = Utc
            .timestamp_opt(data.change_time, 0)
            .single()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        Some(formatted)
    }

    /// Fixed-width hex keeps lexicographic order identical to numeric
    /// order on the raw epoch value.
    fn sort_change(&self, data: &Family) -> String {
        format!("{:012x}", data.change_time)
    }

    fn column_tooltip(&self, _data: &Family) -> Option<String> {
        Some("Family".to_string())
    }

    fn sort_id(&self, data: &Family) -> String {
        self.column_id(data).unwrap_or_default()
    }

    fn sort_type(&self, data: &Family) -> String {
        self.column_type(data).unwrap_or_default()
    }

    fn sort_handle(&self, data: &Family) -> String {
        self.column_handle(data).unwrap_or_default()
    }

    fn sort_tag_color(&self, data: &Family) -> String {
        self.column_tag_color(data).unwrap_or_default()
    }

    fn sort_tooltip(&self, data: &Family) -> String {
        self.column_tooltip(data).unwrap_or_default()
    }
}

impl<'a> TableModel for FamilyModel<'a> {
    type Row = Family;

    fn n_columns(&self) -> usize {
        self.fmap.len()
    }

    fn color_column(&self) -> Option<usize> {
        Some(8)
    }

    fn tooltip_column(&self) -> Option<usize> {
        Some(9)
    }

    fn cell(&self, row: &Family, col: usize) -> Option<String> {
        self.fmap.get(col).and_then(|f| f(self, row))
    }

    fn sort_key(&self, row: &Family, col: usize) -> String {
        self.smap
            .get(col)
            .map(|f| f(self, row))
            .unwrap_or_default()
    }
}
