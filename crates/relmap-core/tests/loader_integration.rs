//! Integration tests for schema loading against SQLite.

#![cfg(feature = "sqlite")]

use pretty_assertions::assert_eq;
use relmap_core::{
    AccessorPolicy, ClassDefinition, ClassExtension, ClassRegistry, Error, ExtensionError,
    ExtensionSource, LoadWarning, LoaderConfig, LoaderOptions, MemoryRegistry, MonikerOverride,
    RelationshipKind, SchemaLoader, SqliteConnection,
};

fn database(sql: &str) -> SqliteConnection {
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.execute_batch(sql).unwrap();
    conn
}

const MUSIC: &str = "
    CREATE TABLE artist (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL
    );
    CREATE TABLE cd (
        id INTEGER PRIMARY KEY,
        artist_id INTEGER NOT NULL REFERENCES artist(id),
        title TEXT NOT NULL
    );
";

const HR: &str = "
    CREATE TABLE department (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE employee (
        id INTEGER PRIMARY KEY,
        dept_id INTEGER REFERENCES department(id),
        backup_dept_id INTEGER REFERENCES department(id)
    );
";

fn music_options() -> LoaderOptions {
    LoaderOptions::new().with_moniker_map(MonikerOverride::map([("cd", "CD")]))
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

#[test]
fn test_single_foreign_key_relationships() {
    let mut loader = SchemaLoader::new(database(MUSIC), music_options());
    let mut registry = MemoryRegistry::new();

    let report = loader.load(&mut registry).unwrap();
    assert_eq!(report.monikers, vec!["Artist", "CD"]);
    assert_eq!(report.relationships, 2);
    assert!(report.warnings.is_empty());

    let artist = registry.class("Artist").unwrap();
    let cds = artist.relationship("cds").unwrap();
    assert_eq!(cds.kind, RelationshipKind::HasMany);
    assert_eq!(cds.target, "CD");
    assert_eq!(cds.condition.to_string(), r#"{"foreign.artist_id": "self.id"}"#);

    let cd = registry.class("CD").unwrap();
    let owner = cd.relationship("artist").unwrap();
    assert_eq!(owner.kind, RelationshipKind::BelongsTo);
    assert_eq!(owner.target, "Artist");
    assert_eq!(owner.condition.to_string(), r#"{"foreign.id": "self.artist_id"}"#);

    assert_eq!(cd.primary_key, vec!["id"]);
    assert_eq!(
        cd.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["id", "artist_id", "title"]
    );
}

#[test]
fn test_multiple_keys_to_one_table() {
    let mut loader = SchemaLoader::new(database(HR), LoaderOptions::new());
    let mut registry = MemoryRegistry::new();
    loader.load(&mut registry).unwrap();

    let department = registry.class("Department").unwrap();
    let reverse: Vec<String> = department
        .relationships
        .iter()
        .map(|r| r.accessor.clone())
        .collect();
    assert_eq!(
        sorted(reverse),
        vec!["employee_backup_dept_ids", "employee_dept_ids"]
    );

    let employee = registry.class("Employee").unwrap();
    assert!(employee.relationship("dept").is_some());
    assert!(employee.relationship("backup_dept").is_some());
}

#[test]
fn test_table_without_primary_key() {
    let conn = database("CREATE TABLE log (line TEXT, at TIMESTAMP);");
    let mut loader = SchemaLoader::new(conn, LoaderOptions::new());
    let mut registry = MemoryRegistry::new();

    let report = loader.load(&mut registry).unwrap();

    assert_eq!(
        report.warnings,
        vec![LoadWarning::NoPrimaryKey {
            table: "log".into()
        }]
    );
    let log = registry.class("Log").unwrap();
    assert!(log.primary_key.is_empty());
    assert_eq!(log.columns.len(), 2);
}

#[test]
fn test_planning_is_idempotent() {
    let conn = database(&format!("{MUSIC}{HR}"));
    let loader = SchemaLoader::new(conn, music_options());

    let first = loader.plan().unwrap();
    let second = loader.plan().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.classes().len(), 4);
}

#[test]
fn test_unnamed_keys_get_tokens_not_names() {
    let loader = SchemaLoader::new(database(HR), LoaderOptions::new());
    let schema = loader.plan().unwrap();

    let bindings: Vec<_> = schema.plan().bindings_for("Employee").to_vec();
    assert_eq!(bindings.len(), 2);

    let tokens: Vec<String> = sorted(bindings.iter().map(|b| b.fk_token.clone()).collect());
    assert_eq!(tokens, vec!["_1", "_2"]);

    for binding in schema.plan().iter() {
        assert!(!binding.accessor.contains("_1"));
        assert!(!binding.accessor.contains("_2"));
    }
}

#[test]
fn test_table_filters() {
    let conn = database(&format!("{MUSIC}{HR}"));
    let options = music_options().with_constraint("^(artist|cd|employee)$").unwrap();
    let mut loader = SchemaLoader::new(conn, options);
    let mut registry = MemoryRegistry::new();

    let report = loader.load(&mut registry).unwrap();

    assert_eq!(report.monikers, vec!["Artist", "CD", "Employee"]);
    let dangling: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| matches!(w, LoadWarning::DanglingForeignKey { .. }))
        .collect();
    assert_eq!(dangling.len(), 2);
    assert!(registry.class("Employee").unwrap().relationships.is_empty());
}

const BROKEN: &str = "
    CREATE TABLE artist (id INTEGER PRIMARY KEY);
    CREATE TABLE poster (
        id INTEGER PRIMARY KEY,
        artist_uuid INTEGER REFERENCES artist(uuid)
    );
";

#[test]
fn test_unapplicable_relationship_is_fatal() {
    let mut loader = SchemaLoader::new(database(BROKEN), LoaderOptions::new());
    let mut registry = MemoryRegistry::new();

    let err = loader.load(&mut registry).unwrap_err();
    assert!(matches!(err, Error::RelationshipApply { .. }));
    assert!(registry.is_empty());
}

#[test]
fn test_best_effort_skips_relationship() {
    let options = LoaderOptions::new().with_best_effort(true);
    let mut loader = SchemaLoader::new(database(BROKEN), options);
    let mut registry = MemoryRegistry::new();

    let report = loader.load(&mut registry).unwrap();

    assert_eq!(report.monikers, vec!["Artist", "Poster"]);
    assert_eq!(report.relationships, 0);
    let skipped: Vec<_> = report
        .warnings
        .iter()
        .filter_map(|w| match w {
            LoadWarning::RelationshipSkipped {
                entity, accessor, ..
            } => Some(format!("{entity}.{accessor}")),
            _ => None,
        })
        .collect();
    assert_eq!(sorted(skipped), vec!["Artist.posters", "Poster.artist_uuid"]);
}

const AMBIGUOUS: &str = "
    CREATE TABLE promo (id INTEGER PRIMARY KEY);
    CREATE TABLE cd (
        id INTEGER NOT NULL,
        artist INTEGER NOT NULL,
        PRIMARY KEY (id, artist)
    );
    CREATE TABLE sale (
        id INTEGER PRIMARY KEY,
        cd_id INTEGER REFERENCES promo(id),
        ref_id INTEGER,
        ref_artist INTEGER,
        FOREIGN KEY (ref_id, ref_artist) REFERENCES cd(id, artist)
    );
";

#[test]
fn test_accessor_collision_last_wins() {
    let mut loader = SchemaLoader::new(database(AMBIGUOUS), LoaderOptions::new());
    let mut registry = MemoryRegistry::new();
    loader.load(&mut registry).unwrap();

    let sale = registry.class("Sale").unwrap();
    assert_eq!(
        sale.relationships
            .iter()
            .filter(|r| r.accessor == "cd")
            .count(),
        1
    );
}

#[test]
fn test_accessor_collision_strict() {
    let options = LoaderOptions::new().with_accessor_policy(AccessorPolicy::Strict);
    let mut loader = SchemaLoader::new(database(AMBIGUOUS), options);
    let mut registry = MemoryRegistry::new();

    let err = loader.load(&mut registry).unwrap_err();
    assert!(matches!(
        err,
        Error::AccessorCollision { ref entity, ref accessor } if entity == "Sale" && accessor == "cd"
    ));
}

#[test]
fn test_rescan_registers_new_tables() {
    let mut loader = SchemaLoader::new(database(MUSIC), music_options());
    let mut registry = MemoryRegistry::new();
    loader.load(&mut registry).unwrap();

    loader
        .connection()
        .execute_batch(
            "CREATE TABLE track (
                 id INTEGER PRIMARY KEY,
                 cd_id INTEGER NOT NULL REFERENCES cd,
                 title TEXT
             );",
        )
        .unwrap();

    let report = loader.rescan(&mut registry).unwrap();

    assert_eq!(report.new_monikers, vec!["Track"]);
    assert_eq!(report.monikers, vec!["CD", "Track"]);
    assert_eq!(report.relationships, 2);

    let cd = registry.class("CD").unwrap();
    assert!(cd.relationship("artist").is_some());
    let tracks = cd.relationship("tracks").unwrap();
    assert_eq!(tracks.condition.to_string(), r#"{"foreign.cd_id": "self.id"}"#);

    let track = registry.class("Track").unwrap();
    assert_eq!(track.relationship("cd").unwrap().target, "CD");
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_rescan_without_changes_registers_nothing() {
    let mut loader = SchemaLoader::new(database(MUSIC), music_options());
    let mut registry = MemoryRegistry::new();
    loader.load(&mut registry).unwrap();
    let before = registry.clone();

    let report = loader.rescan(&mut registry).unwrap();

    assert!(report.new_monikers.is_empty());
    assert!(report.monikers.is_empty());
    assert_eq!(registry, before);
}

struct AuditExtensions;

impl ExtensionSource for AuditExtensions {
    fn load(
        &self,
        moniker: &str,
    ) -> Result<Option<Box<dyn ClassExtension>>, ExtensionError> {
        if moniker != "CD" {
            return Ok(None);
        }
        Ok(Some(Box::new(
            |class: &mut ClassDefinition| -> relmap_core::Result<()> {
                class.mixins.push("Audited".to_string());
                Ok(())
            },
        )))
    }
}

#[test]
fn test_extensions_and_mixins() {
    let options = music_options().with_mixin("Timestamps");
    let mut loader =
        SchemaLoader::new(database(MUSIC), options).with_extensions(Box::new(AuditExtensions));
    let mut registry = MemoryRegistry::new();
    loader.load(&mut registry).unwrap();

    assert_eq!(registry.class("CD").unwrap().mixins, vec!["Timestamps", "Audited"]);
    assert_eq!(registry.class("Artist").unwrap().mixins, vec!["Timestamps"]);
}

#[test]
fn test_on_disk_database_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("music.db");
    SqliteConnection::open(&db_path)
        .unwrap()
        .execute_batch(MUSIC)
        .unwrap();

    let config_path = dir.path().join("relmap.json");
    std::fs::write(
        &config_path,
        r#"{"moniker_map": {"cd": "Disc"}, "inflect_plural": {"cd": "discs"}}"#,
    )
    .unwrap();

    let options = LoaderConfig::from_file(&config_path)
        .unwrap()
        .into_options()
        .unwrap();
    let mut loader = SchemaLoader::new(SqliteConnection::open(&db_path).unwrap(), options);
    let mut registry = MemoryRegistry::new();
    loader.load(&mut registry).unwrap();

    let artist = registry.class("Artist").unwrap();
    assert_eq!(artist.relationship("discs").unwrap().target, "Disc");
}
