use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::ApiError;
use crate::events::repo_types::NewEvent;

lazy_static! {
    static ref FOOD_RE: Regex = Regex::new(
        r"(?i)\b(food|foods|pizza|snacks?|lunch|dinner|breakfast|brunch|refreshments|cookies?|donuts?|doughnuts?|bagels?|coffee|tea|boba|ice cream|desserts?|treats|tacos?|burritos?|sandwich(es)?|sushi|wings|bbq|barbecue|cater(ed|ing)|dumplings?|cake|cupcakes?|candy|chocolate|popcorn|fries|burgers?|noodles|ramen)\b"
    )
    .unwrap();
    static ref CLOCK_RE: Regex = Regex::new(r"^\d{2}.\d{2}").unwrap();
}

/// Whether an event description mentions food being offered.
pub fn has_food(content: Option<&str>) -> bool {
    content.is_some_and(|c| FOOD_RE.is_match(c))
}

/// Event object as returned by the Facebook Graph API.
#[derive(Debug, Deserialize)]
pub struct GraphEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: String,
    pub place: GraphPlace,
}

#[derive(Debug, Deserialize)]
pub struct GraphPlace {
    pub name: Option<String>,
    pub location: GraphLocation,
}

#[derive(Debug, Deserialize)]
pub struct GraphLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// `2018-04-20T19:00:00-0400` -> `2018-04-20 19:00`.
pub fn graph_start_to_datetime(start_time: &str) -> Option<String> {
    let (date, clock) = start_time.split_once('T')?;
    let hm = CLOCK_RE.find(clock)?;
    Some(format!("{} {}", date, hm.as_str()))
}

impl TryFrom<GraphEvent> for NewEvent {
    type Error = ApiError;

    fn try_from(ev: GraphEvent) -> Result<Self, Self::Error> {
        let datetime = graph_start_to_datetime(&ev.start_time)
            .ok_or_else(|| ApiError::BadRequest("Invalid start_time".into()))?;
        Ok(NewEvent {
            name: ev.name,
            location: ev.place.name,
            datetime: Some(datetime),
            content: ev.description,
            longitude: Some(ev.place.location.longitude.to_string()),
            latitude: Some(ev.place.location.latitude.to_string()),
        })
    }
}

/// Keeps only the events that offer food.
pub fn food_events(events: Vec<NewEvent>) -> Vec<NewEvent> {
    events
        .into_iter()
        .filter(|e| has_food(e.content.as_deref()))
        .collect()
}
