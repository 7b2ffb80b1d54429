use rusqlite::Connection;

use crate::error::Result;

/// Id of the workspace finalized registration data is published into.
pub const GLOBAL_WORKSPACE_ID: &str = "global";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    password TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0,
    date_joined TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workspaces (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    owner TEXT,
    is_public INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS version_managers (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    user TEXT,
    is_disabled INTEGER NOT NULL DEFAULT 0,
    is_default INTEGER NOT NULL DEFAULT 0,
    current_version_id TEXT,
    creation_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    version_manager_id TEXT NOT NULL REFERENCES version_managers(id) ON DELETE CASCADE,
    version_number INTEGER NOT NULL,
    filename TEXT NOT NULL,
    content TEXT NOT NULL,
    hash TEXT NOT NULL,
    display_name TEXT NOT NULL DEFAULT '',
    is_disabled INTEGER NOT NULL DEFAULT 0,
    creation_date TEXT NOT NULL,
    UNIQUE (version_manager_id, version_number)
);

CREATE TABLE IF NOT EXISTS user_metadata (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    template_id TEXT NOT NULL REFERENCES templates(id),
    user_id TEXT NOT NULL,
    workspace_id TEXT REFERENCES workspaces(id) ON DELETE SET NULL,
    xml_content TEXT NOT NULL,
    creation_date TEXT NOT NULL,
    last_modification_date TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS user_metadata_title ON user_metadata(title);
CREATE INDEX IF NOT EXISTS user_metadata_template ON user_metadata(template_id);
CREATE INDEX IF NOT EXISTS user_metadata_user ON user_metadata(user_id);

CREATE TABLE IF NOT EXISTS user_data_structures (
    id TEXT PRIMARY KEY,
    user TEXT NOT NULL,
    template_id TEXT NOT NULL REFERENCES templates(id),
    name TEXT NOT NULL,
    form_string TEXT,
    data_structure_element_root_id TEXT,
    data_id TEXT REFERENCES user_metadata(id) ON DELETE CASCADE,
    creation_date TEXT NOT NULL,
    last_modification_date TEXT NOT NULL,
    UNIQUE (user, template_id, name)
);
CREATE INDEX IF NOT EXISTS user_data_structures_creation ON user_data_structures(creation_date);

CREATE TABLE IF NOT EXISTS data_structure_elements (
    id TEXT PRIMARY KEY,
    data_structure_id TEXT NOT NULL REFERENCES user_data_structures(id) ON DELETE CASCADE,
    parent_id TEXT,
    position INTEGER NOT NULL,
    tag TEXT NOT NULL,
    value TEXT,
    options TEXT NOT NULL DEFAULT '{}',
    creation_date TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS data_structure_elements_owner ON data_structure_elements(data_structure_id);

CREATE TABLE IF NOT EXISTS account_requests (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    date TEXT NOT NULL,
    metadata_id TEXT REFERENCES user_metadata(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS mail_outbox (
    id TEXT PRIMARY KEY,
    recipients TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    creation_date TEXT NOT NULL
);
"#;

/// Create every table if missing, plus the global public workspace.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.execute(
        "INSERT OR IGNORE INTO workspaces (id, title, owner, is_public) VALUES (?1, ?2, NULL, 1)",
        [GLOBAL_WORKSPACE_ID, "Global Public Workspace"],
    )?;
    Ok(())
}
