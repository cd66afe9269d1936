pub const CONFIG_DIR: &str = ".config/tagview";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const BASE_URL_ENV: &str = "TAGVIEW_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:2222";
pub const ENTER_BASE_URL: &str = "Enter the url of the tags API: ";
pub const COMPLETE_SETUP: &str = "To view the available commands, type: tagview --help";

pub const TAGS_ENDPOINT: &str = "/tags";
/// Fixed page size sent as `_per_page`
pub const PER_PAGE: u32 = 10;
pub const DEBOUNCE_DELAY_MS: u64 = 1000;
pub const STALE_TIME_SECS: u64 = 60;
/// Unused cache entries are dropped after this long
pub const CACHE_TIME_SECS: u64 = 300;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const HELP_TEXT: &str = "Type text to search tags, then:
  :filter        apply the search text (back to page 1)
  :clear         clear the search text
  :page <N>      go to page N
  :next :prev    next or previous page
  :first :last   first or last page
  :refresh       fetch the current page again
  :back          go back to the previous location
  :create        create a new tag
  :export        export tags
  :menu <ID>     open the actions of a tag
  :help          show this help
  :quit          exit";

/// Standard message
#[derive(Debug)]
pub enum Message {
    NotAvailable(String),
    RowMenu(String),
    UnknownCommand(String),
    NoHistory,
    ConfigSaved(String),
    FetchFailed(String),
}

impl Message {
    pub fn to_formatted_string(&self) -> String {
        match self {
            Message::NotAvailable(action) => format!("'{}' is not available yet", action),
            Message::RowMenu(tag_id) => format!("Actions for tag '{}' are not available yet", tag_id),
            Message::UnknownCommand(command) => {
                format!("Unknown command ':{}'. Type :help to see the commands", command)
            }
            Message::NoHistory => "There is no previous location".to_string(),
            Message::ConfigSaved(path) => format!("Config saved: {}", path),
            Message::FetchFailed(error) => {
                format!("Failed to load tags: {}. Type :refresh to try again", error)
            }
        }
    }
}
