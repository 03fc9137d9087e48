use crate::document::CellValue;
use crate::locator::NamedRow;

/// Ordered canonical field → accepted header aliases. The first alias with a
/// filled value wins.
#[derive(Debug, Clone, Copy)]
pub struct HeaderMap<F: 'static> {
    entries: &'static [(F, &'static [&'static str])],
}

impl<F: Copy + PartialEq + 'static> HeaderMap<F> {
    pub const fn new(entries: &'static [(F, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    pub fn aliases(&self, field: F) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    /// Raw cell for `field`: the first alias whose value is not blank.
    pub fn resolve<'r>(&self, row: &'r NamedRow, field: F) -> Option<&'r CellValue> {
        self.aliases(field)
            .iter()
            .filter_map(|alias| row.get(alias))
            .find(|cell| !cell.is_blank())
    }

    /// Header alias of `field` present in `headers`, in alias priority order.
    pub fn matched_alias(&self, headers: &[String], field: F) -> Option<&'static str> {
        self.aliases(field).iter().copied().find(|alias| {
            headers
                .iter()
                .any(|h| h.trim().eq_ignore_ascii_case(alias.trim()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawSheet;
    use crate::locator::{locate, DEFAULT_HEADER_KEYWORDS};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Field {
        Revenue,
        Orders,
    }

    const ALIASES: &[(Field, &[&str])] = &[
        (Field::Revenue, &["Netto Omzet", "Omzet Netto", "Net Revenue"]),
        (Field::Orders, &["Orders"]),
    ];
    const MAP: HeaderMap<Field> = HeaderMap::new(ALIASES);

    #[test]
    fn test_first_filled_alias_wins() {
        let sheet = RawSheet::from_strings(
            "s",
            &[
                vec!["Datum", "Net Revenue", "Netto Omzet"],
                vec!["01-03-2026", "900", ""],
                vec!["02-03-2026", "900", "1000"],
            ],
        );
        let table = locate(&sheet, DEFAULT_HEADER_KEYWORDS);

        assert_eq!(
            MAP.resolve(&table.rows[0], Field::Revenue),
            Some(&CellValue::Text("900".to_string()))
        );
        assert_eq!(
            MAP.resolve(&table.rows[1], Field::Revenue),
            Some(&CellValue::Text("1000".to_string()))
        );
        assert_eq!(MAP.resolve(&table.rows[1], Field::Orders), None);
        assert_eq!(
            MAP.matched_alias(&table.headers, Field::Revenue),
            Some("Netto Omzet")
        );
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let fields: Vec<Field> = MAP.fields().collect();
        assert_eq!(fields, vec![Field::Revenue, Field::Orders]);
        assert_eq!(MAP.aliases(Field::Orders), &["Orders"]);
    }
}
