//! Descriptor parsing and the row-index transform.
//!
//! Board elements carry their game coordinate only inside a click handler
//! string such as `didClick(3, 4)`. This module is the one place that
//! string is parsed or produced. It also owns the mapping between the
//! page's top-down row index (1-based) and the game's bottom-up row
//! coordinate (0-based).

use crate::board::Position;
use crate::error::{DriverError, Result};

/// Function name used in descriptors rendered by the checkers page.
pub const DESCRIPTOR_FUNCTION: &str = "didClick";

/// Parse a `name(column, row)` descriptor.
///
/// The function name must be an identifier, the arguments two
/// non-negative integers separated by a comma. Whitespace around the
/// arguments is tolerated; anything else is rejected.
pub fn decode(descriptor: &str) -> Result<Position> {
    let malformed = || DriverError::MalformedDescriptor {
        descriptor: descriptor.to_string(),
    };

    let trimmed = descriptor.trim();
    let (name, rest) = trimmed.split_once('(').ok_or_else(malformed)?;
    if !is_identifier(name) {
        return Err(malformed());
    }
    let args = rest.strip_suffix(')').ok_or_else(malformed)?;
    let (column, row) = args.split_once(',').ok_or_else(malformed)?;

    let column = parse_coordinate(column).ok_or_else(malformed)?;
    let row = parse_coordinate(row).ok_or_else(malformed)?;
    Ok(Position::new(column, row))
}

/// The `(column, row)` argument list a descriptor ends with for
/// `position`. Used as a substring predicate when probing for a specific
/// cell; the parentheses keep `(1, 3)` from matching `(11, 3)`.
pub fn encode(position: Position) -> String {
    format!("({}, {})", position.column, position.row)
}

/// Full descriptor for `position`, as the page renders it.
pub fn descriptor(position: Position) -> String {
    format!("{}{}", DESCRIPTOR_FUNCTION, encode(position))
}

/// Page row index (1 = top) holding game row `game_row`, or `None` when
/// the row is off the board.
pub fn query_row_for(total_rows: usize, game_row: i32) -> Option<usize> {
    let total = i32::try_from(total_rows).ok()?;
    if game_row < 0 || game_row >= total {
        return None;
    }
    usize::try_from(total - game_row).ok()
}

/// Game row coordinate rendered in page row `query_row`.
pub fn game_row_for(total_rows: usize, query_row: usize) -> Option<i32> {
    if query_row == 0 || query_row > total_rows {
        return None;
    }
    i32::try_from(total_rows - query_row).ok()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_coordinate(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_decode_page_descriptor() {
        assert_eq!(decode("didClick(3, 4)").unwrap(), Position::new(3, 4));
        assert_eq!(decode("didClick(0,7)").unwrap(), Position::new(0, 7));
        assert_eq!(decode("  f( 5 , 1 ) ").unwrap(), Position::new(5, 1));
    }

    #[test]
    fn test_decode_rejects_malformed_descriptors() {
        for bad in [
            "",
            "didClick",
            "didClick(3)",
            "didClick(3, 4",
            "didClick(a, 4)",
            "didClick(-1, 4)",
            "didClick(3, 4, 5)",
            "(3, 4)",
            "1f(3, 4)",
            "didClick(3, 4);",
        ] {
            match decode(bad) {
                Err(DriverError::MalformedDescriptor { descriptor }) => assert_eq!(descriptor, bad),
                other => panic!("{:?} decoded to {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_decode_inverts_descriptor() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let pos = Position::new(rng.gen_range(0..8), rng.gen_range(0..8));
            assert_eq!(decode(&descriptor(pos)).unwrap(), pos);
        }
    }

    #[test]
    fn test_encode_is_descriptor_fragment() {
        let pos = Position::new(6, 2);
        assert_eq!(encode(pos), "(6, 2)");
        assert_eq!(descriptor(pos), "didClick(6, 2)");
        assert!(descriptor(pos).contains(&encode(pos)));
    }

    #[test]
    fn test_fragment_is_exact_for_two_digit_columns() {
        let fragment = encode(Position::new(1, 3));
        assert!(!descriptor(Position::new(11, 3)).contains(&fragment));
        assert!(!descriptor(Position::new(1, 13)).contains(&fragment));
        assert!(descriptor(Position::new(1, 3)).contains(&fragment));
    }

    #[test]
    fn test_row_transform() {
        // Game row 0 is the bottom page row; game row 7 is the top one.
        assert_eq!(query_row_for(8, 0), Some(8));
        assert_eq!(query_row_for(8, 2), Some(6));
        assert_eq!(query_row_for(8, 3), Some(5));
        assert_eq!(query_row_for(8, 7), Some(1));
        assert_eq!(query_row_for(8, 8), None);
        assert_eq!(query_row_for(8, -1), None);
    }

    #[test]
    fn test_row_transform_inverse() {
        for query_row in 1..=8 {
            let game_row = game_row_for(8, query_row).unwrap();
            assert_eq!(query_row_for(8, game_row), Some(query_row));
        }
        assert_eq!(game_row_for(8, 0), None);
        assert_eq!(game_row_for(8, 9), None);
    }
}
