//! Delivery / service location selected by the user

use crate::store::Reducer;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationState {
    pub city: Option<String>,
    pub pincode: Option<String>,
}

impl LocationState {
    /// Whether both city and pincode are known
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.city.is_some() && self.pincode.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationAction {
    SetCity(String),
    /// Ignored unless it is six digits
    SetPincode(String),
    Clear,
}

#[derive(Debug)]
pub struct LocationReducer;

impl Reducer for LocationReducer {
    type State = LocationState;
    type Action = LocationAction;
    type Error = Infallible;

    fn reduce(state: &mut LocationState, action: LocationAction) -> Result<(), Infallible> {
        match action {
            LocationAction::SetCity(city) => {
                let city = city.trim().to_string();
                state.city = (!city.is_empty()).then_some(city);
            }
            LocationAction::SetPincode(pin) => {
                let pin = pin.trim();
                if pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit()) {
                    state.pincode = Some(pin.to_string());
                } else {
                    tracing::debug!(pin, "ignoring malformed pincode");
                }
            }
            LocationAction::Clear => *state = LocationState::default(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_pincode_is_ignored() {
        let mut state = LocationState::default();
        LocationReducer::reduce(&mut state, LocationAction::SetPincode("560001".into())).unwrap();
        LocationReducer::reduce(&mut state, LocationAction::SetPincode("56A00".into())).unwrap();
        assert_eq!(state.pincode.as_deref(), Some("560001"));
    }

    #[test]
    fn blank_city_clears() {
        let mut state = LocationState::default();
        LocationReducer::reduce(&mut state, LocationAction::SetCity("Pune".into())).unwrap();
        LocationReducer::reduce(&mut state, LocationAction::SetPincode("411001".into())).unwrap();
        assert!(state.is_complete());
        LocationReducer::reduce(&mut state, LocationAction::SetCity("  ".into())).unwrap();
        assert!(!state.is_complete());
    }
}
