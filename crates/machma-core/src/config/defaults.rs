pub(super) fn default_data_dir() -> String {
    "~/.machma".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_db_path() -> String {
    "~/.machma/data/machma.db".to_string()
}
pub(super) fn default_max_connections() -> u32 {
    4
}
pub(super) fn default_true() -> bool {
    true
}
