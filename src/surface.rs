use crate::board::ElementHandle;
use crate::error::Result;
use std::time::Duration;

/// Attribute holding an element's image source; owner and emptiness
/// markers are matched against it.
pub const SRC_ATTRIBUTE: &str = "src";
/// Attribute holding an element's descriptor.
pub const DESCRIPTOR_ATTRIBUTE: &str = "onclick";

/// Structural predicate over board elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    /// Page row (1-based, top-down). `None` matches every row.
    pub row: Option<usize>,
    /// Substring the element's image source must contain.
    pub src_marker: String,
    /// Substring the element's descriptor must contain.
    pub descriptor_fragment: Option<String>,
}

impl ElementQuery {
    pub fn in_row(row: usize, src_marker: &str) -> Self {
        ElementQuery {
            row: Some(row),
            src_marker: src_marker.to_string(),
            descriptor_fragment: None,
        }
    }

    pub fn anywhere(src_marker: &str) -> Self {
        ElementQuery {
            row: None,
            src_marker: src_marker.to_string(),
            descriptor_fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.descriptor_fragment = Some(fragment.into());
        self
    }

    /// Whether an element with these attributes satisfies the predicate.
    pub fn matches(&self, src: &str, descriptor: Option<&str>) -> bool {
        if !src.contains(&self.src_marker) {
            return false;
        }
        match (&self.descriptor_fragment, descriptor) {
            (None, _) => true,
            (Some(fragment), Some(descriptor)) => descriptor.contains(fragment.as_str()),
            (Some(_), None) => false,
        }
    }

    /// XPath expression selecting the same elements on the checkers page.
    pub fn to_xpath(&self) -> String {
        let row = match self.row {
            Some(row) => format!("div[{}]", row),
            None => "div".to_string(),
        };
        let mut conditions = format!("contains(@{},'{}')", SRC_ATTRIBUTE, self.src_marker);
        if let Some(fragment) = &self.descriptor_fragment {
            conditions.push_str(&format!(
                " and contains(@{},'{}')",
                DESCRIPTOR_ATTRIBUTE, fragment
            ));
        }
        format!("//div[@id='board']/{}/*[{}]", row, conditions)
    }
}

/// The narrow capability the driver consumes from whatever automation
/// layer renders the board (a browser session, a simulator, ...).
///
/// Queries never fail on zero matches; they return zero or an empty list.
/// Results of two queries are only comparable when no command was issued
/// between them.
pub trait BoardSurface {
    /// Number of elements matching `query`.
    fn query_count(&self, query: &ElementQuery) -> Result<usize> {
        Ok(self.query_all(query)?.len())
    }

    /// Matching elements in document order (rows top-down, left to right).
    fn query_all(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>>;

    /// Read an attribute; `None` when the element does not carry it.
    fn read_attribute(&self, handle: ElementHandle, name: &str) -> Result<Option<String>>;

    /// Click the element. Fire-and-forget: the effect is only visible to
    /// later queries.
    fn activate(&mut self, handle: ElementHandle) -> Result<()>;

    /// Block for `delay`. The only suspension point the driver uses.
    fn wait_fixed_delay(&mut self, delay: Duration) -> Result<()>;

    /// Number of rows the board renders.
    fn row_count(&self) -> Result<usize>;

    /// Press the page's restart control.
    fn restart(&mut self) -> Result<()>;

    /// Title of the page hosting the board.
    fn title(&self) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_piece_xpath() {
        let query = ElementQuery::in_row(6, "you1");
        assert_eq!(
            query.to_xpath(),
            "//div[@id='board']/div[6]/*[contains(@src,'you1')]"
        );
    }

    #[test]
    fn test_reachable_cell_xpath() {
        let query = ElementQuery::in_row(5, "gray").with_fragment("(1, 3)");
        assert_eq!(
            query.to_xpath(),
            "//div[@id='board']/div[5]/*[contains(@src,'gray') and contains(@onclick,'(1, 3)')]"
        );
    }

    #[test]
    fn test_whole_board_xpath() {
        assert_eq!(
            ElementQuery::anywhere("me1").to_xpath(),
            "//div[@id='board']/div/*[contains(@src,'me1')]"
        );
    }

    #[test]
    fn test_matches_requires_fragment_when_given() {
        let query = ElementQuery::in_row(5, "gray").with_fragment("(1, 3)");
        assert!(query.matches("gray.gif", Some("didClick(1, 3)")));
        assert!(!query.matches("gray.gif", Some("didClick(3, 3)")));
        assert!(!query.matches("gray.gif", None));
        assert!(!query.matches("you1.gif", Some("didClick(1, 3)")));
        assert!(ElementQuery::anywhere("me1").matches("me1.gif", None));
    }
}
