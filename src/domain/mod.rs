//! Domain Layer - Core logic for the pairs screener
//!
//! Pure types and functions with no I/O:
//! - `frame_decoder`: heuristic extraction of token addresses from feed frames
//! - `token_map`: the daily identifier -> symbol record, symbol sanitizing, day keys

pub mod frame_decoder;
pub mod token_map;

pub use frame_decoder::{is_pairs_frame, FrameDecoder, FRAME_PREAMBLE, MIN_TOKEN_LEN, PAIRS_MARKER};
pub use token_map::{day_key, sanitize_symbol, DayClock, TokenMap, BAD_SYMBOL};
