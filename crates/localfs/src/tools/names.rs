//! Canonical tool name constants.
//!
//! Tool-name string literals reference these constants so a rename only
//! touches this file.

// Index
pub const BUILD_FILE_INDEX: &str = "build_file_index";
pub const REFRESH_INDEX: &str = "refresh_index";
pub const INDEX_STATUS: &str = "index_status";

// Queries
pub const SEARCH_FILE_BY_NAME: &str = "search_file_by_name";
pub const FIND_BY_EXTENSION: &str = "find_by_extension";
pub const FIND_BY_TYPE: &str = "find_by_type";
pub const RECENT_FILES: &str = "recent_files";
pub const FILES_MODIFIED_AFTER: &str = "files_modified_after";
pub const FILES_MODIFIED_TODAY: &str = "files_modified_today";
pub const LARGE_FILES: &str = "large_files";
pub const SMALL_FILES: &str = "small_files";
pub const FILES_IN_FOLDER: &str = "files_in_folder";
pub const GROUP_BY_EXTENSION: &str = "group_by_extension";
pub const TOP_EXTENSIONS: &str = "top_extensions";
pub const FIND_DUPLICATES: &str = "find_duplicates";

// Mutations
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const APPEND_TO_FILE: &str = "append_to_file";
pub const DELETE_FILE: &str = "delete_file";
pub const DELETE_FOLDER: &str = "delete_folder";
pub const CREATE_FOLDER: &str = "create_folder";
pub const MOVE_FILE: &str = "move_file";
pub const COPY_FILE: &str = "copy_file";
pub const RENAME_FILE: &str = "rename_file";

/// Every tool the filesystem toolset registers.
pub const ALL: &[&str] = &[
    BUILD_FILE_INDEX,
    REFRESH_INDEX,
    INDEX_STATUS,
    SEARCH_FILE_BY_NAME,
    FIND_BY_EXTENSION,
    FIND_BY_TYPE,
    RECENT_FILES,
    FILES_MODIFIED_AFTER,
    FILES_MODIFIED_TODAY,
    LARGE_FILES,
    SMALL_FILES,
    FILES_IN_FOLDER,
    GROUP_BY_EXTENSION,
    TOP_EXTENSIONS,
    FIND_DUPLICATES,
    READ_FILE,
    WRITE_FILE,
    APPEND_TO_FILE,
    DELETE_FILE,
    DELETE_FOLDER,
    CREATE_FOLDER,
    MOVE_FILE,
    COPY_FILE,
    RENAME_FILE,
];
