//! Headless maintenance shell for archives: inspect and repair media
//! attachments without starting the desktop UI.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use app_settings::AppSettings;
use archive::{
    ArchiveDb, ArchivePath, ArchiveService, Family, MediaObject, Person, Place, Source,
};
use core_types::Name;
use tracing::debug;
use workbench::editors::DeleteMediaQuery;
use workbench::views::{FamilyModel, TableModel};

const HELP: &str = "\
kindred - genealogy archive maintenance shell

USAGE:
  kindred [--archive PATH] <COMMAND>

COMMANDS:
  create                      create (or open) an archive
  families                    print the family table
  add person <GIVEN> <SURNAME>
                              create a person record
  add family [--father H] [--mother H]
                              create a family record
  media list                  list media objects
  media refs <HANDLE>         list records referencing a media object
  media attach <OWNER> <FILE> [--description TEXT]
                              attach a file to a record
  media rm <HANDLE>           delete a media object and sweep references

OPTIONS:
  --archive PATH              archive to operate on (defaults to the last
                              one used)
  -h, --help                  print this help
";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let archive_flag: Option<PathBuf> = args.opt_value_from_str("--archive")?;
    let mut settings = AppSettings::load().unwrap_or_default();

    let archive_path = match archive_flag {
        Some(path) => ArchivePath::new(path).into_path(),
        None => settings
            .last_archive
            .clone()
            .ok_or_else(|| anyhow!("no archive given and none remembered; pass --archive"))?,
    };

    let command = args
        .subcommand()?
        .ok_or_else(|| anyhow!("missing command; try --help"))?;

    let db = ArchiveDb::open(&archive_path)
        .with_context(|| format!("failed to open archive {}", archive_path.display()))?;
    let mut svc = ArchiveService::new(db);
    debug!(archive = %archive_path.display(), %command, "archive opened");

    match command.as_str() {
        "create" => {
            println!("archive ready at {}", archive_path.display());
        }
        "families" => print_families(&svc, &settings)?,
        "add" => run_add(&mut args, &mut svc)?,
        "media" => run_media(&mut args, &mut svc)?,
        other => bail!("unknown command {other}; try --help"),
    }

    settings.record_archive(&archive_path);
    if let Err(err) = settings.save() {
        debug!(error = %err, "settings not saved");
    }
    Ok(())
}

fn run_add(args: &mut pico_args::Arguments, svc: &mut ArchiveService) -> Result<()> {
    let sub = args
        .subcommand()?
        .ok_or_else(|| anyhow!("missing add subcommand; try --help"))?;
    match sub.as_str() {
        "person" => {
            let given: String = args.free_from_str().context("missing given name")?;
            let surname: String = args.free_from_str().context("missing surname")?;
            let person = svc.create_person(Name::new(given, surname))?;
            println!("added {} ({})", person.id, person.handle);
        }
        "family" => {
            let father: Option<String> = args.opt_value_from_str("--father")?;
            let mother: Option<String> = args.opt_value_from_str("--mother")?;
            let family = svc.create_family(father.as_deref(), mother.as_deref())?;
            println!("added {} ({})", family.id, family.handle);
        }
        other => bail!("unknown add subcommand {other}; try --help"),
    }
    Ok(())
}

fn run_media(args: &mut pico_args::Arguments, svc: &mut ArchiveService) -> Result<()> {
    let sub = args
        .subcommand()?
        .ok_or_else(|| anyhow!("missing media subcommand; try --help"))?;
    match sub.as_str() {
        "list" => {
            for object in MediaObject::load_all(&svc.db)? {
                println!(
                    "{}  {}  {}  {}  {}",
                    object.id, object.handle, object.mime_type, object.path, object.description
                );
            }
        }
        "refs" => {
            let handle: String = args.free_from_str().context("missing media handle")?;
            for backref in svc.references_to(&handle)? {
                println!("{}  {}  {}", backref.kind.label(), backref.id, backref.label);
            }
        }
        "attach" => {
            let description: Option<String> = args.opt_value_from_str("--description")?;
            let owner: String = args.free_from_str().context("missing owner handle")?;
            let file: PathBuf = args.free_from_str().context("missing file path")?;
            let handle = attach_to_owner(svc, &owner, &file, description.as_deref())?;
            println!("attached {} to {}", handle, owner);
        }
        "rm" => {
            let handle: String = args.free_from_str().context("missing media handle")?;
            DeleteMediaQuery::new(&handle)
                .with_refresh(|| println!("removed {handle}"))
                .execute(svc)?;
        }
        other => bail!("unknown media subcommand {other}; try --help"),
    }
    Ok(())
}

/// Attach a file to whichever record class owns the handle.
fn attach_to_owner(
    svc: &mut ArchiveService,
    owner: &str,
    file: &Path,
    description: Option<&str>,
) -> Result<String> {
    if let Some(mut person) = Person::find(&svc.db, owner)? {
        return Ok(svc.attach_media_file(&mut person, file, description)?);
    }
    if let Some(mut family) = Family::find(&svc.db, owner)? {
        return Ok(svc.attach_media_file(&mut family, file, description)?);
    }
    if let Some(mut source) = Source::find(&svc.db, owner)? {
        return Ok(svc.attach_media_file(&mut source, file, description)?);
    }
    if let Some(mut place) = Place::find(&svc.db, owner)? {
        return Ok(svc.attach_media_file(&mut place, file, description)?);
    }
    bail!("no record with handle {owner}")
}

fn print_families(svc: &ArchiveService, settings: &AppSettings) -> Result<()> {
    let model = FamilyModel::new(&svc.db, settings.invalid_date_format.clone());
    println!("id      father                mother                type       marriage    tags");
    for row in model.sorted_rows(0, true)? {
        let cell = |col: usize| model.cell(&row, col).unwrap_or_default();
        println!(
            "{:<7} {:<21} {:<21} {:<10} {:<11} {}",
            cell(0),
            cell(1),
            cell(2),
            cell(3),
            cell(4),
            cell(5),
        );
    }
    Ok(())
}
