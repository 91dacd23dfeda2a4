//! Navigation contract
//!
//! Screens hand identifiers to each other only through the path or the query
//! string. Search queries are carried with spaces as `+`.

use crate::types::{BookingId, CatalogKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Search { query: String },
    CatalogList(CatalogKind),
    CatalogDetail { kind: CatalogKind, id: String },
    Cart,
    Checkout,
    HealthAssessment,
    AssessmentResult,
    BookingConfirmation { booking_id: BookingId },
    /// Order placed from the cart
    OrderConfirmation { order_id: String },
}

impl Route {
    /// Path (and query) for this route
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Search { query } => format!("/search?q={}", query.trim().replace(' ', "+")),
            Self::CatalogList(kind) => format!("/{}", kind.path_segment()),
            Self::CatalogDetail { kind, id } => format!("/{}/{id}", kind.path_segment()),
            Self::Cart => "/cart".to_string(),
            Self::Checkout => "/checkout".to_string(),
            Self::HealthAssessment => "/health-assessment".to_string(),
            Self::AssessmentResult => "/health-assessment/result".to_string(),
            Self::BookingConfirmation { booking_id } => format!("/booking-confirmation/{booking_id}"),
            Self::OrderConfirmation { order_id } => format!("/order-confirmation/{order_id}"),
        }
    }

    /// Parse a path produced by [`Route::path`]
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Self::Home),
            ["search"] => {
                let q = query
                    .into_iter()
                    .flat_map(|q| q.split('&'))
                    .find_map(|pair| pair.strip_prefix("q="))
                    .unwrap_or_default();
                Some(Self::Search {
                    query: q.replace('+', " "),
                })
            }
            ["cart"] => Some(Self::Cart),
            ["checkout"] => Some(Self::Checkout),
            ["health-assessment"] => Some(Self::HealthAssessment),
            ["health-assessment", "result"] => Some(Self::AssessmentResult),
            ["booking-confirmation", id] => Some(Self::BookingConfirmation {
                booking_id: BookingId::new(*id),
            }),
            ["order-confirmation", id] => Some(Self::OrderConfirmation {
                order_id: (*id).to_string(),
            }),
            [segment] => CatalogKind::from_path_segment(segment).map(Self::CatalogList),
            [segment, id] => CatalogKind::from_path_segment(segment).map(|kind| Self::CatalogDetail {
                kind,
                id: (*id).to_string(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_confirmation_carries_id() {
        let route = Route::BookingConfirmation {
            booking_id: BookingId::new("b-123"),
        };
        assert_eq!(route.path(), "/booking-confirmation/b-123");
        assert_eq!(Route::parse(&route.path()), Some(route));
    }

    #[test]
    fn search_query_round_trip() {
        let route = Route::Search {
            query: "vitamin d".into(),
        };
        assert_eq!(route.path(), "/search?q=vitamin+d");
        assert_eq!(Route::parse("/search?q=vitamin+d"), Some(route));
    }

    #[test]
    fn catalog_routes() {
        assert_eq!(
            Route::parse("/lab-tests/cbc"),
            Some(Route::CatalogDetail {
                kind: CatalogKind::LabTest,
                id: "cbc".into()
            })
        );
        assert_eq!(Route::parse("/doctors"), Some(Route::CatalogList(CatalogKind::Doctor)));
        assert_eq!(Route::parse("/nowhere/at/all"), None);
        assert_eq!(Route::parse("/"), Some(Route::Home));
    }
}
