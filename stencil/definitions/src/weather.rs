//! Weather service definition.
//!
//! A small REST service for looking up cities and their forecasts. It
//! covers every HTTP binding the REST protocol supports: path labels, query
//! parameters, headers, and plain JSON body members.
//!
//! ## Operations
//!
//! - `GetCity` - GET /cities/{cityId}
//! - `ListCities` - GET /cities
//! - `GetForecast` - GET /cities/{cityId}/forecast
//! - `CreateCity` - POST /cities
//! - `DeleteCity` - DELETE /cities/{cityId}

use stencil_define::prelude::*;

/// Namespace of every weather shape.
pub const NAMESPACE: &str = "example.weather";

fn id(name: &str) -> ShapeId {
    ShapeId::new(NAMESPACE, name)
}

fn string() -> ShapeId {
    ShapeId::prelude("String")
}

/// Id of the `Weather` service.
pub fn service_id() -> ShapeId {
    id("Weather")
}

/// Creates the weather model.
///
/// ## Examples
///
/// ```rust
/// use stencil_definitions::weather::{define_weather_model, service_id};
///
/// let model = define_weather_model().unwrap();
/// let service = model.service(&service_id()).unwrap();
/// assert_eq!(service.operations.len(), 5);
/// ```
pub fn define_weather_model() -> Result<Model, ModelError> {
    Model::with_prelude()
        .with_shape(Shape::structure(
            id("CityCoordinates"),
            vec![
                Member::required("latitude", ShapeId::prelude("Float")),
                Member::required("longitude", ShapeId::prelude("Float")),
            ],
        ))?
        .with_shape(Shape::structure(
            id("City"),
            vec![
                Member::required("cityId", string()),
                Member::required("name", string()),
                Member::required("coordinates", id("CityCoordinates")),
                Member::optional("population", ShapeId::prelude("Long")).with_trait(Trait::Boxed),
            ],
        ))?
        .with_shape(Shape::structure(
            id("CitySummary"),
            vec![
                Member::required("cityId", string()),
                Member::required("name", string()),
            ],
        ))?
        .with_shape(Shape::list(
            id("CitySummaries"),
            Member::required("member", id("CitySummary")),
        ))?
        .with_shape(Shape::enumeration(
            id("Conditions"),
            vec![
                EnumValue::new("SUNNY", "sunny"),
                EnumValue::new("CLOUDY", "cloudy"),
                EnumValue::new("RAIN", "rain"),
                EnumValue::new("SNOW", "snow"),
            ],
        ))?
        .with_shape(
            Shape::enumeration(
                id("Units"),
                vec![
                    EnumValue::new("METRIC", "metric"),
                    EnumValue::new("IMPERIAL", "imperial"),
                ],
            )
            .with_trait(Trait::Documentation("Measurement system for temperatures.".to_string())),
        )?
        .with_shape(Shape::structure(
            id("Forecast"),
            vec![
                Member::optional("conditions", id("Conditions")),
                Member::optional("high", ShapeId::prelude("Integer")),
                Member::optional("low", ShapeId::prelude("Integer")),
                Member::optional("chanceOfRain", ShapeId::prelude("Float"))
                    .with_trait(Trait::JsonName("chance_of_rain".to_string())),
            ],
        ))?
        // GetCity
        .with_shape(Shape::structure(
            id("GetCityInput"),
            vec![Member::required("cityId", string()).with_trait(Trait::HttpLabel)],
        ))?
        // ListCities
        .with_shape(Shape::structure(
            id("ListCitiesInput"),
            vec![
                Member::optional("nextToken", string())
                    .with_trait(Trait::HttpQuery("nextToken".to_string())),
                Member::optional("pageSize", ShapeId::prelude("Integer"))
                    .with_trait(Trait::Boxed)
                    .with_trait(Trait::HttpQuery("pageSize".to_string())),
            ],
        ))?
        .with_shape(Shape::structure(
            id("ListCitiesOutput"),
            vec![
                Member::required("items", id("CitySummaries")),
                Member::optional("nextToken", string()),
            ],
        ))?
        // GetForecast
        .with_shape(Shape::structure(
            id("GetForecastInput"),
            vec![
                Member::required("cityId", string()).with_trait(Trait::HttpLabel),
                Member::optional("units", id("Units"))
                    .with_trait(Trait::HttpQuery("units".to_string())),
            ],
        ))?
        .with_shape(Shape::structure(
            id("GetForecastOutput"),
            vec![
                Member::optional("forecast", id("Forecast")),
                Member::optional("generatedAt", ShapeId::prelude("Timestamp")),
            ],
        ))?
        // CreateCity
        .with_shape(Shape::structure(
            id("CreateCityInput"),
            vec![
                Member::optional("clientToken", string())
                    .with_trait(Trait::HttpHeader("X-Client-Token".to_string())),
                Member::required("name", string()),
                Member::required("coordinates", id("CityCoordinates")),
                Member::optional("population", ShapeId::prelude("Long")).with_trait(Trait::Boxed),
            ],
        ))?
        .with_shape(Shape::structure(
            id("CreateCityOutput"),
            vec![Member::required("city", id("City"))],
        ))?
        // DeleteCity
        .with_shape(Shape::structure(
            id("DeleteCityInput"),
            vec![Member::required("cityId", string()).with_trait(Trait::HttpLabel)],
        ))?
        .with_operation(
            Operation::new(id("GetCity"))
                .with_input(id("GetCityInput"))
                .with_output(id("City"))
                .with_http(HttpTrait::new(HttpMethod::Get, "/cities/{cityId}"))
                .with_documentation("Returns one city."),
        )?
        .with_operation(
            Operation::new(id("ListCities"))
                .with_input(id("ListCitiesInput"))
                .with_output(id("ListCitiesOutput"))
                .with_http(HttpTrait::new(HttpMethod::Get, "/cities"))
                .with_documentation("Lists cities a page at a time."),
        )?
        .with_operation(
            Operation::new(id("GetForecast"))
                .with_input(id("GetForecastInput"))
                .with_output(id("GetForecastOutput"))
                .with_http(HttpTrait::new(HttpMethod::Get, "/cities/{cityId}/forecast")),
        )?
        .with_operation(
            Operation::new(id("CreateCity"))
                .with_input(id("CreateCityInput"))
                .with_output(id("CreateCityOutput"))
                .with_http(HttpTrait::new(HttpMethod::Post, "/cities")),
        )?
        .with_operation(
            Operation::new(id("DeleteCity"))
                .with_input(id("DeleteCityInput"))
                .with_http(HttpTrait::new(HttpMethod::Delete, "/cities/{cityId}")),
        )?
        .with_service(
            Service::new(service_id(), "2006-03-01")
                .with_operation(id("GetCity"))
                .with_operation(id("ListCities"))
                .with_operation(id("GetForecast"))
                .with_operation(id("CreateCity"))
                .with_operation(id("DeleteCity"))
                .with_protocol(Protocol::RestJson1)
                .with_documentation("Provides weather forecasts for cities."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_uri_templates() {
        let model = define_weather_model().unwrap();
        let operation = model.operation(&id("GetForecast")).unwrap();
        let input = model.shape(operation.input.as_ref().unwrap()).unwrap();
        let uri = &operation.http.as_ref().unwrap().uri;

        for member in input.members().iter().filter(|m| m.is_http_label()) {
            assert!(uri.contains(&format!("{{{}}}", member.name)), "{} not in {}", member.name, uri);
        }
    }

    #[test]
    fn model_round_trips_through_json() {
        let model = define_weather_model().unwrap();
        let json = model.to_json().unwrap();
        let parsed = Model::from_json(&json).unwrap();
        assert_eq!(parsed, model);
    }
}
