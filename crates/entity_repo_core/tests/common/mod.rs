#![allow(dead_code)]

use entity_repo_core::db::open_db_in_memory;
use entity_repo_core::{
    Entity, EntityDescriptor, EntityId, GenericRepository, NamedQueryRegistry, ParameterMap,
    RepoResult, SqliteSession,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

pub const WIDGET_SCHEMA: &str = "
CREATE TABLE widgets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT 1700000000000,
    revision INTEGER NOT NULL DEFAULT 0
);

CREATE TRIGGER widgets_bump_revision
AFTER UPDATE OF name, quantity ON widgets
BEGIN
    UPDATE widgets SET revision = revision + 1 WHERE id = NEW.id;
END;
";

pub const WIDGET: EntityDescriptor = EntityDescriptor {
    name: "Widget",
    table: "widgets",
    id_column: "id",
    columns: &["name", "quantity"],
    generated_columns: &["created_at", "revision"],
};

pub const WIDGET_SELECT: &str = "SELECT id, name, quantity, created_at, revision FROM widgets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub id: Option<EntityId>,
    pub name: String,
    pub quantity: i64,
    pub created_at: i64,
    pub revision: i64,
}

impl Widget {
    pub fn new(name: &str, quantity: i64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            quantity,
            created_at: 0,
            revision: 0,
        }
    }
}

impl Entity for Widget {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone()), Value::Integer(self.quantity)]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            quantity: row.get("quantity")?,
            created_at: row.get("created_at")?,
            revision: row.get("revision")?,
        })
    }
}

pub fn widget_queries() -> NamedQueryRegistry {
    let mut registry = NamedQueryRegistry::new();
    registry
        .register(
            "Widget.byName",
            format!("{WIDGET_SELECT} WHERE name = :name"),
        )
        .unwrap();
    registry
        .register(
            "Widget.byMinQuantity",
            format!("{WIDGET_SELECT} WHERE quantity >= :min ORDER BY id"),
        )
        .unwrap();
    registry
        .register("Widget.all", format!("{WIDGET_SELECT} ORDER BY id"))
        .unwrap();
    registry
        .register(
            "Widget.byQuantityDesc",
            format!("{WIDGET_SELECT} ORDER BY quantity DESC, name"),
        )
        .unwrap();
    registry
        .register(
            "Widget.byNameAnnotated",
            format!("{WIDGET_SELECT} WHERE name = :name -- unique by convention"),
        )
        .unwrap();
    registry
        .register(
            "Widget.restock",
            "UPDATE widgets SET quantity = quantity + :delta WHERE quantity < :below",
        )
        .unwrap();
    registry
        .register("Widget.purgeEmpty", "DELETE FROM widgets WHERE quantity = 0")
        .unwrap();
    registry
}

/// In-memory connection holding the widget schema.
pub fn widget_db() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(WIDGET_SCHEMA).unwrap();
    conn
}

pub fn widget_session(conn: &Connection) -> SqliteSession<'_> {
    SqliteSession::new(conn).with_named_queries(widget_queries())
}

/// Concrete repository built on the generic base.
pub struct WidgetRepository<'s> {
    inner: GenericRepository<'s, Widget, SqliteSession<'s>>,
}

impl<'s> WidgetRepository<'s> {
    pub fn try_new(session: &'s SqliteSession<'s>) -> RepoResult<Self> {
        Ok(Self {
            inner: GenericRepository::try_new(session, WIDGET)?,
        })
    }

    pub fn generic(&self) -> &GenericRepository<'s, Widget, SqliteSession<'s>> {
        &self.inner
    }

    pub fn find_by_name(&self, name: &str) -> RepoResult<Option<Widget>> {
        let params = ParameterMap::new().with("name", name.to_string());
        self.inner.find_single_by_named_query("Widget.byName", Some(&params))
    }

    pub fn restock(&self, below: i64, delta: i64) -> RepoResult<usize> {
        let params = ParameterMap::new().with("below", below).with("delta", delta);
        self.inner.execute_update("Widget.restock", Some(&params))
    }
}

/// Saves one widget per `(name, quantity)` pair, in order, and returns each
/// as the store holds it (store-computed columns included).
pub fn seed(
    repo: &GenericRepository<'_, Widget, SqliteSession<'_>>,
    items: &[(&str, i64)],
) -> Vec<Widget> {
    items
        .iter()
        .map(|(name, quantity)| {
            let mut widget = Widget::new(name, *quantity);
            repo.save(&mut widget).unwrap();
            repo.load(widget.id).unwrap().unwrap()
        })
        .collect()
}
