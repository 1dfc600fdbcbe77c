//! GeoJSON export of grid cells for viewing in GIS tools.

use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};

use crate::error::Result;
use crate::grid::{Cell, Grid};

fn cell_feature(cell: &Cell) -> Feature {
    let mut ring: Vec<Vec<f64>> = cell
        .coordinates
        .iter()
        .map(|p| vec![p.longitude, p.latitude])
        .collect();
    ring.push(ring[0].clone());

    let mut props = JsonObject::new();
    props.insert("id".to_string(), JsonValue::from(cell.id.clone()));
    props.insert("row".to_string(), JsonValue::from(cell.row));
    props.insert("col".to_string(), JsonValue::from(cell.col));
    props.insert("status".to_string(), JsonValue::from(cell.status.to_string()));
    props.insert(
        "targetRate".to_string(),
        cell.target_rate.map_or(JsonValue::Null, JsonValue::from),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: Some(Id::String(cell.id.clone())),
        properties: Some(props),
        foreign_members: None,
    }
}

/// Builds a feature collection with one polygon per cell.
pub fn grid_to_geojson(grid: &Grid) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: grid.cells().iter().map(cell_feature).collect(),
        foreign_members: None,
    }
}

/// Writes the grid as a GeoJSON feature collection.
pub fn write_grid_geojson(path: &str, grid: &Grid) -> Result<()> {
    let geojson = GeoJson::FeatureCollection(grid_to_geojson(grid));
    super::write_string(path, &geojson.to_string())?;
    log::info!("Wrote {} cell polygon(s) to {path}", grid.len());
    Ok(())
}
