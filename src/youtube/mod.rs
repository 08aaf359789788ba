pub mod channel;
pub mod utils;

pub use channel::{ChannelResolver, HttpChannelResolver};
pub use utils::{build_watch_url, is_valid_video_id, is_watch_page, is_youtube_url, parse_watch_id};
