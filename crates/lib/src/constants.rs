//! Constants used throughout the boardsync library.
//!
//! Wire-level names and limits shared by the server, the client and the tests.

/// Header carrying the acting user's id on every HTTP request.
pub const USER_HEADER: &str = "x-user-id";

/// Optional header carrying the acting user's display name. Used when the
/// user creates a board and becomes its first member.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Query parameter accepted in place of [`USER_HEADER`] on the websocket
/// endpoint, for clients that cannot set headers on an upgrade request.
pub const USER_QUERY_PARAM: &str = "userId";

/// Maximum length of a board, list or task title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Number of events buffered per board room before slow subscribers lag.
pub const ROOM_CAPACITY: usize = 256;

/// Default number of activity entries returned by the activity endpoint.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

/// Default number of entries in a user's recent activity feed.
pub const DEFAULT_RECENT_ACTIVITY_LIMIT: usize = 3;

/// Upper bound on activity entries returned in one request.
pub const MAX_ACTIVITY_LIMIT: usize = 100;

/// File name of the JSON snapshot written into the data directory.
pub const SNAPSHOT_FILE: &str = "boardsync.json";
