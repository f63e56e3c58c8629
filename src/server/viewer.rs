//! Viewer module - generates the HTML page that shows the pyramid with Leaflet.
//!
//! The page probes the root tile first. If it loads, the local pyramid is shown
//! in a planar (`CRS.Simple`) map clamped to the image bounds; otherwise the
//! page falls back to a public basemap and explains why with a popup.

use crate::pyramid::PyramidLayout;

/// URL template under which the server exposes tiles.
pub const TILE_URL_TEMPLATE: &str = "/tiles/{z}/{x}/{y}.png";

/// Public basemap used when local tiles are missing.
pub const FALLBACK_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

pub const FALLBACK_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Where the fallback basemap is centered (latitude, longitude).
pub const FALLBACK_CENTER: (f64, f64) = (48.8566, 2.3522);

pub const FALLBACK_ZOOM: u8 = 5;

pub const FALLBACK_MAX_ZOOM: u8 = 19;

/// Delay before re-laying the map after entering or leaving fullscreen.
pub const FULLSCREEN_RELAYOUT_MS: u32 = 200;

const LEAFLET_VERSION: &str = "1.9.4";

/// Public basemap shown when the pyramid's root tile cannot be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackBasemap {
    pub url_template: String,
    pub attribution: String,
    pub center: (f64, f64),
    pub zoom: u8,
    pub max_zoom: u8,
}

impl Default for FallbackBasemap {
    fn default() -> Self {
        Self {
            url_template: FALLBACK_TILE_URL.to_string(),
            attribution: FALLBACK_ATTRIBUTION.to_string(),
            center: FALLBACK_CENTER,
            zoom: FALLBACK_ZOOM,
            max_zoom: FALLBACK_MAX_ZOOM,
        }
    }
}

/// Settings baked into the viewer page.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    /// Page heading and `<title>`
    pub title: String,
    pub fallback: FallbackBasemap,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            title: "Tile Viewer".to_string(),
            fallback: FallbackBasemap::default(),
        }
    }
}

impl ViewerOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// URL of the level-0 root tile the page probes for.
pub fn root_tile_url() -> String {
    TILE_URL_TEMPLATE
        .replace("{z}", "0")
        .replace("{x}", "0")
        .replace("{y}", "0")
}

/// Escape HTML special characters to prevent XSS attacks.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Quote a string as a JavaScript literal safe to embed in a `<script>` block.
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

/// Generate the viewer page for `layout`.
pub fn generate_viewer_html(layout: &PyramidLayout, options: &ViewerOptions) -> String {
    let bounds = layout.bounds();
    let fallback = &options.fallback;
    let escaped_title = html_escape(&options.title);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{escaped_title}</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet_version}/dist/leaflet.css">
    <script src="https://unpkg.com/leaflet@{leaflet_version}/dist/leaflet.js"></script>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: #f4f4f2;
            color: #222;
        }}
        header {{
            padding: 16px 24px;
        }}
        header h1 {{
            font-size: 20px;
            font-weight: 600;
        }}
        header .meta {{
            font-size: 12px;
            color: #666;
            margin-top: 4px;
        }}
        #map {{
            width: 100%;
            height: calc(100vh - 140px);
            min-height: 400px;
            background: transparent;
            border: none;
            outline: none;
        }}
        .banner {{
            display: none;
            margin: 12px 24px;
            padding: 12px 16px;
            border-radius: 4px;
            font-size: 13px;
        }}
        .banner.visible {{
            display: block;
        }}
        .banner.warning {{
            background: #fff3cd;
            border: 1px solid #ffeeba;
        }}
        .banner.success {{
            background: #d4edda;
            border: 1px solid #c3e6cb;
        }}
        .fullscreen-button {{
            width: 30px;
            height: 30px;
            line-height: 30px;
            font-size: 20px;
            text-align: center;
            font-weight: bold;
            text-decoration: none;
            background-color: white;
            color: #333;
            display: block;
        }}
    </style>
</head>
<body>
    <header>
        <h1>{escaped_title}</h1>
        <div class="meta">{width} x {height} px &middot; zoom 0-{max_zoom} &middot; {tile_size} px tiles</div>
    </header>

    <div id="map"></div>

    <div id="status-missing" class="banner warning">
        <strong>Tiles not found.</strong>
        The tile directory does not contain a generated pyramid; showing the public basemap instead.
    </div>
    <div id="status-partial" class="banner warning">
        <strong>Incomplete pyramid.</strong>
        <span id="status-partial-details"></span>
    </div>
    <div id="status-ok" class="banner success">
        Map loaded. Scroll or use +/- to zoom, drag to pan, &#x26F6; for fullscreen.
    </div>

    <script>
        const tileUrlTemplate = {tile_url_template};
        const rootTileUrl = {root_tile_url};
        const maxZoom = {max_zoom};
        const tileSize = {tile_size};
        const imageBounds = [[{south}, {west}], [{north}, {east}]];

        const fallback = {{
            url: {fallback_url},
            attribution: {fallback_attribution},
            center: [{fallback_lat}, {fallback_lng}],
            zoom: {fallback_zoom},
            maxZoom: {fallback_max_zoom}
        }};

        const mapContainer = document.getElementById('map');

        function show(id) {{
            document.getElementById(id).classList.add('visible');
        }}

        function createMap(crs, minZoom, maxZoomLevel) {{
            const map = L.map(mapContainer, {{
                crs: crs,
                minZoom: minZoom,
                maxZoom: maxZoomLevel,
                zoomSnap: 0.25,
                zoomDelta: 0.5,
                wheelPxPerZoomLevel: 120,
                attributionControl: false,
                zoomControl: false
            }});
            addControls(map);
            return map;
        }}

        function showPyramid() {{
            const map = createMap(L.CRS.Simple, 0, maxZoom);
            const bounds = L.latLngBounds(imageBounds);

            const layer = L.tileLayer(tileUrlTemplate, {{
                minZoom: 0,
                maxZoom: maxZoom,
                noWrap: true,
                tileSize: tileSize,
                bounds: bounds
            }}).addTo(map);

            map.setMaxBounds(bounds);
            map.fitBounds(bounds);

            layer.on('load', function() {{
                console.log('Tiles loaded');
            }});

            show('status-ok');
            checkCompleteness();
        }}

        function showFallback(reason) {{
            console.log('Local tiles unavailable:', reason);

            const map = createMap(L.CRS.EPSG3857, 0, fallback.maxZoom);
            L.tileLayer(fallback.url, {{
                maxZoom: fallback.maxZoom,
                attribution: fallback.attribution
            }}).addTo(map);

            map.setView(fallback.center, fallback.zoom);

            L.marker(fallback.center).addTo(map)
                .bindPopup('Tiles are not available. Check that the tile directory contains the generated pyramid.')
                .openPopup();

            show('status-missing');
        }}

        function checkCompleteness() {{
            fetch('/pyramid')
                .then(function(response) {{
                    if (!response.ok) throw new Error('HTTP ' + response.status);
                    return response.json();
                }})
                .then(function(pyramid) {{
                    if (pyramid.complete) return;
                    const incomplete = pyramid.levels
                        .filter(function(level) {{ return !level.complete; }})
                        .map(function(level) {{
                            return 'zoom ' + level.zoom + ' (' + level.present_tiles + '/' + level.expected_tiles + ' tiles)';
                        }});
                    document.getElementById('status-partial-details').textContent =
                        'Missing tiles at ' + incomplete.join(', ') + '. Some areas will stay blank.';
                    show('status-partial');
                }})
                .catch(function(error) {{
                    console.log('Pyramid check failed:', error);
                }});
        }}

        function isFullscreen() {{
            return document.fullscreenElement || document.webkitFullscreenElement ||
                document.mozFullScreenElement || document.msFullscreenElement;
        }}

        function toggleFullscreen() {{
            if (!isFullscreen()) {{
                if (mapContainer.requestFullscreen) {{
                    mapContainer.requestFullscreen();
                }} else if (mapContainer.mozRequestFullScreen) {{
                    mapContainer.mozRequestFullScreen();
                }} else if (mapContainer.webkitRequestFullscreen) {{
                    mapContainer.webkitRequestFullscreen();
                }} else if (mapContainer.msRequestFullscreen) {{
                    mapContainer.msRequestFullscreen();
                }}
            }} else {{
                if (document.exitFullscreen) {{
                    document.exitFullscreen();
                }} else if (document.mozCancelFullScreen) {{
                    document.mozCancelFullScreen();
                }} else if (document.webkitExitFullscreen) {{
                    document.webkitExitFullscreen();
                }} else if (document.msExitFullscreen) {{
                    document.msExitFullscreen();
                }}
            }}
        }}

        function addControls(map) {{
            map.dragging.enable();
            map.touchZoom.enable();
            map.doubleClickZoom.enable();
            map.scrollWheelZoom.enable();

            L.control.zoom({{ position: 'bottomright' }}).addTo(map);

            const FullscreenControl = L.Control.extend({{
                options: {{ position: 'bottomright' }},
                onAdd: function() {{
                    const container = L.DomUtil.create('div', 'leaflet-bar leaflet-control');
                    const button = L.DomUtil.create('a', 'fullscreen-button', container);
                    button.innerHTML = '&#x26F6;';
                    button.href = '#';
                    button.title = 'Fullscreen';
                    L.DomEvent
                        .on(button, 'click', L.DomEvent.stopPropagation)
                        .on(button, 'click', L.DomEvent.preventDefault)
                        .on(button, 'click', toggleFullscreen);
                    return container;
                }}
            }});
            map.addControl(new FullscreenControl());

            const relayout = function() {{
                setTimeout(function() {{ map.invalidateSize(); }}, {fullscreen_relayout_ms});
            }};
            ['fullscreenchange', 'webkitfullscreenchange', 'mozfullscreenchange', 'MSFullscreenChange']
                .forEach(function(event) {{ document.addEventListener(event, relayout); }});
        }}

        fetch(rootTileUrl)
            .then(function(response) {{
                if (!response.ok) throw new Error('Root tile returned HTTP ' + response.status);
                showPyramid();
            }})
            .catch(showFallback);
    </script>
</body>
</html>"##,
        escaped_title = escaped_title,
        leaflet_version = LEAFLET_VERSION,
        width = layout.width,
        height = layout.height,
        max_zoom = layout.max_zoom,
        tile_size = layout.tile_size,
        tile_url_template = js_string(TILE_URL_TEMPLATE),
        root_tile_url = js_string(&root_tile_url()),
        south = bounds.south,
        west = bounds.west,
        north = bounds.north,
        east = bounds.east,
        fallback_url = js_string(&fallback.url_template),
        fallback_attribution = js_string(&fallback.attribution),
        fallback_lat = fallback.center.0,
        fallback_lng = fallback.center.1,
        fallback_zoom = fallback.zoom,
        fallback_max_zoom = fallback.max_zoom,
        fullscreen_relayout_ms = FULLSCREEN_RELAYOUT_MS,
    )
}
