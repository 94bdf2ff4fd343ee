//! Strict parser for the Wanderlog hydration state
//!
//! Understands `tripPlanStore.data.tripPlan` as emitted into
//! `window.__MOBX_STATE__`. Any deviation from this layout makes the parser
//! decline so the generic scanners get a chance.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::{BlockParse, PayloadParser, RawPlace};

/// Wanderlog `tripPlanStore` schema
pub struct SchemaParser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HydrationState {
    trip_plan_store: TripPlanStore,
}

#[derive(Debug, Deserialize)]
struct TripPlanStore {
    data: TripPlanData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TripPlanData {
    trip_plan: TripPlan,
}

#[derive(Debug, Deserialize)]
struct TripPlan {
    title: Option<String>,
    itinerary: Itinerary,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    sections: Option<Vec<Section>>,
    budget: Option<Budget>,
}

#[derive(Debug, Deserialize)]
struct Budget {
    expenses: Option<Vec<Expense>>,
}

/// Expenses carry the only per-block date in this format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Expense {
    block_id: Option<Value>,
    associated_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Section {
    date: Option<String>,
    blocks: Option<Vec<Block>>,
}

#[derive(Debug, Deserialize)]
struct Block {
    id: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    place: Option<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: Option<String>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: Option<f64>,
    lng: Option<f64>,
}

/// Ids are numbers in some exports and strings in others
fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TripPlan {
    fn block_dates(&self) -> HashMap<String, String> {
        self.itinerary
            .budget
            .as_ref()
            .and_then(|budget| budget.expenses.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|expense| match (&expense.block_id, &expense.associated_date) {
                (Some(id), Some(date)) => Some((id_key(id), date.clone())),
                _ => None,
            })
            .collect()
    }

    fn places(&self) -> Vec<RawPlace> {
        let block_dates = self.block_dates();
        let mut places = Vec::new();

        for section in self.itinerary.sections.iter().flatten() {
            for block in section.blocks.iter().flatten() {
                if block.kind.as_deref() != Some("place") {
                    continue;
                }
                let Some(place) = &block.place else {
                    continue;
                };
                let location = place.geometry.as_ref().and_then(|g| g.location.as_ref());
                let date = block
                    .id
                    .as_ref()
                    .and_then(|id| block_dates.get(&id_key(id)))
                    .or(section.date.as_ref())
                    .filter(|date| !date.is_empty())
                    .cloned();

                places.push(RawPlace {
                    name: place.name.clone(),
                    latitude: location.and_then(|l| l.lat),
                    longitude: location.and_then(|l| l.lng),
                    date,
                });
            }
        }
        places
    }
}

impl PayloadParser for SchemaParser {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn parse(&self, payload: &str) -> Option<BlockParse> {
        let state: HydrationState = serde_json::from_str(payload).ok()?;
        let trip_plan = state.trip_plan_store.data.trip_plan;
        Some(BlockParse {
            title: trip_plan.title.clone().filter(|t| !t.trim().is_empty()),
            places: trip_plan.places(),
        })
    }
}
