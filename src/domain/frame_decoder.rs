//! Pairs Frame Decoder
//!
//! Turns a raw binary frame from the DexScreener pairs feed into the list of
//! token addresses it carries. The frame is not parsed structurally: every
//! byte is projected to printable ASCII and the addresses are recovered from
//! the long runs of text that survive.
//!
//! Classification order matters and must stay ETH -> pump -> fallback.

use regex::Regex;
use tracing::debug;

/// Protocol preamble every pairs frame starts with
pub const FRAME_PREAMBLE: &[u8] = b"\x00\n1.3.0\n";

/// Marker that identifies a frame carrying the pairs list
pub const PAIRS_MARKER: &[u8] = b"pairs";

/// Minimum length of a text run that can hold an address
pub const MIN_TOKEN_LEN: usize = 55;

/// Length of a Solana-style address taken from the end of a run
const SOLANA_ADDRESS_LEN: usize = 44;

/// Characters that end the useful part of a text run
const TRUNCATE_CHARS: [char; 9] = ['"', '*', '<', '$', '@', '(', ')', ',', '.'];

const ETH_ADDRESS_PATTERN: &str = r"0x[0-9a-fA-F]+";
const PUMP_ADDRESS_PATTERN: &str = r".{0,40}pump";

/// Check whether a frame is a pairs frame worth decoding
///
/// Both the preamble and the `pairs` marker are required.
pub fn is_pairs_frame(raw: &[u8]) -> bool {
    raw.starts_with(FRAME_PREAMBLE)
        && raw
            .windows(PAIRS_MARKER.len())
            .any(|window| window == PAIRS_MARKER)
}

/// Project a binary frame onto printable ASCII, replacing everything else with spaces
pub fn printable_projection(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { ' ' })
        .collect()
}

/// Cut a text run at the first frame-structure character
fn truncate_run(run: &str) -> &str {
    match run.find(|c: char| TRUNCATE_CHARS.contains(&c)) {
        Some(idx) => &run[..idx],
        None => run,
    }
}

fn strip_leading_v(address: &str) -> &str {
    address.strip_prefix('V').unwrap_or(address)
}

/// Heuristic decoder for DexScreener pairs frames
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    eth_address: Regex,
    pump_address: Regex,
}

impl FrameDecoder {
    /// Create a decoder with the address patterns compiled
    pub fn new() -> Self {
        Self {
            eth_address: Regex::new(ETH_ADDRESS_PATTERN).expect("ETH address pattern is valid"),
            pump_address: Regex::new(PUMP_ADDRESS_PATTERN).expect("pump address pattern is valid"),
        }
    }

    /// Decode a raw frame into candidate token addresses, in frame order
    ///
    /// No de-duplication happens here. Malformed frames may produce garbage
    /// identifiers; that is accepted.
    pub fn decode(&self, raw: &[u8]) -> Vec<String> {
        let text = printable_projection(raw);

        let addresses: Vec<String> = text
            .split_whitespace()
            .filter(|run| run.len() >= MIN_TOKEN_LEN)
            .map(truncate_run)
            .filter_map(|run| self.classify(run))
            .collect();

        debug!("Decoded {} candidate addresses from {} byte frame", addresses.len(), raw.len());
        addresses
    }

    /// Extract the address from a single truncated text run
    fn classify(&self, run: &str) -> Option<String> {
        if run.contains("0x") {
            // Last hex run wins
            let address = self.eth_address.find_iter(run).last().map(|m| m.as_str().to_string());
            if address.is_none() {
                debug!("Skipping run with 0x prefix but no hex digits: {}", run);
            }
            return address;
        }

        if run.contains("pump") {
            let found = self.pump_address.find(run)?;
            return Some(strip_leading_v(found.as_str()).to_string());
        }

        // Runs are pure ASCII, so byte slicing is char slicing
        let start = run.len().saturating_sub(SOLANA_ADDRESS_LEN);
        Some(strip_leading_v(&run[start..]).to_string())
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
