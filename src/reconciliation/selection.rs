use crate::models::CatalogEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult<'a> {
    pub winner: Option<&'a CatalogEntry>,
    /// Every filtered entry except the winner, in matching order.
    pub runners_up: Vec<&'a CatalogEntry>,
}

/// Entries tied at the lowest price, in encounter order.
pub fn lowest_price_group<'a>(entries: &[&'a CatalogEntry]) -> Vec<&'a CatalogEntry> {
    let mut group: Vec<&CatalogEntry> = Vec::new();
    for &entry in entries {
        match group.first().map(|current| current.price) {
            None => group.push(entry),
            Some(price) if entry.price == price => group.push(entry),
            Some(price) if entry.price < price => {
                group.clear();
                group.push(entry);
            }
            Some(_) => {}
        }
    }
    group
}

/// Break a price tie with the row's country preference.
///
/// A member matches a token when its country code is contained in the token,
/// so `"th"` matches both `"th"` and `"th-extra"`. Falls back to the first
/// member when nothing matches.
fn pick_by_country<'a>(group: &[&'a CatalogEntry], priority: &[String]) -> Option<&'a CatalogEntry> {
    for token in priority {
        if let Some(&entry) = group
            .iter()
            .find(|entry| token.contains(entry.country_code.as_str()))
        {
            return Some(entry);
        }
    }
    group.first().copied()
}

pub fn select_winner<'a>(
    entries: &[&'a CatalogEntry],
    country_priority: Option<&[String]>,
) -> Option<&'a CatalogEntry> {
    let group = lowest_price_group(entries);
    match (group.len(), country_priority) {
        (0, _) => None,
        (1, _) | (_, None) => group.first().copied(),
        (_, Some(priority)) => pick_by_country(&group, priority),
    }
}

/// Pick the lowest valid price and collect the rest as runners-up.
pub fn select<'a>(entries: &[&'a CatalogEntry], country_priority: Option<&[String]>) -> SelectionResult<'a> {
    let Some(winner) = select_winner(entries, country_priority) else {
        return SelectionResult::default();
    };

    let runners_up = entries
        .iter()
        .copied()
        .filter(|entry| entry.code != winner.code)
        .collect();

    SelectionResult {
        winner: Some(winner),
        runners_up,
    }
}
