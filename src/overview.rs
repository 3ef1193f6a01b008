use std::fs;

use camino::Utf8Path;

use crate::domain::BoundingBox;
use crate::error::HarvestError;

/// Writes a self-contained Leaflet map with the collection area drawn as a
/// rectangle. Purely a convenience artifact: callers treat a render failure
/// as a warning, never as a reason to abort collection or downloads.
pub fn render_map(area: &BoundingBox, destination: &Utf8Path) -> Result<(), HarvestError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    }
    fs::write(destination.as_std_path(), map_html(area))
        .map_err(|err| HarvestError::Filesystem(err.to_string()))
}

fn map_html(area: &BoundingBox) -> String {
    let (center_lat, center_lon) = area.center();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Collection area</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{center_lat}, {center_lon}], 6);
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
L.rectangle([[{lat_min}, {lon_min}], [{lat_max}, {lon_max}]], {{
    color: 'red', weight: 2, fillOpacity: 0.1
}}).addTo(map).bindPopup('Collection area');
</script>
</body>
</html>
"#,
        lat_min = area.lat_min,
        lon_min = area.lon_min,
        lat_max = area.lat_max,
        lon_max = area.lon_max,
    )
}
