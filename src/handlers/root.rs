//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that lists all available
//! endpoints and renders a live status board fed by `/event`.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Endpoints listed on the landing page, relative to the route prefix.
const ENDPOINTS: &[(&str, &str)] = &[
    ("/apps", "Applications with per-instance up/down status and since when (JSON)"),
    ("/sample", "Latest combined memory/CPU sample per instance (JSON)"),
    ("/event", "Live apps + sample stream (Server-Sent Events)"),
    ("/metrics", "Prometheus-compatible self-telemetry"),
    ("/health", "Service health & refresh statistics (text)"),
    ("/config", "Active runtime configuration (read-only)"),
];

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let uptime_secs = state.uptime_seconds();
    Html(render_landing_page(
        &state.config.route_prefix(),
        &state.config.prom_endpoint(),
        uptime_secs,
    ))
}

/// Renders the landing page for the given route prefix.
pub fn render_landing_page(prefix: &str, backend: &str, uptime_secs: u64) -> String {
    let version = env!("CARGO_PKG_VERSION");

    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let endpoints: String = ENDPOINTS
        .iter()
        .map(|(path, desc)| {
            format!(
                r#"        <li>
            <a href="{prefix}{path}">{path}</a>
            <div class="endpoint-desc">{desc}</div>
        </li>
"#
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Herakles Target Monitor</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{
            color: #333;
            border-bottom: 3px solid #007bff;
            padding-bottom: 15px;
            margin-bottom: 10px;
        }}
        .subtitle {{ color: #666; font-size: 1.1em; margin-bottom: 30px; }}
        h2 {{ color: #555; margin-top: 35px; margin-bottom: 15px; }}
        .info {{
            background: #e9ecef;
            padding: 15px;
            border-radius: 4px;
            margin: 20px 0;
            display: flex;
            justify-content: space-around;
            flex-wrap: wrap;
        }}
        .info-item {{ margin: 10px; }}
        .info-label {{ font-weight: 600; color: #555; display: block; font-size: 0.9em; }}
        .info-value {{ font-size: 1.2em; color: #007bff; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 6px 8px; border-bottom: 1px solid #eee; }}
        .UP {{ color: #28a745; font-weight: 600; }}
        .DOWN {{ color: #dc3545; font-weight: 600; }}
        .UNKNOWN {{ color: #6c757d; font-weight: 600; }}
        .endpoint-list {{ list-style: none; padding: 0; }}
        .endpoint-list li {{
            margin: 20px 0;
            padding: 15px;
            background: #f8f9fa;
            border-left: 4px solid #007bff;
            border-radius: 4px;
        }}
        .endpoint-list a {{ color: #007bff; text-decoration: none; font-weight: 600; font-size: 1.1em; }}
        .endpoint-list a:hover {{ text-decoration: underline; }}
        .endpoint-desc {{ color: #666; margin-top: 5px; }}
        .footer {{
            margin-top: 40px;
            padding-top: 20px;
            border-top: 1px solid #ddd;
            color: #666;
            font-size: 0.9em;
            text-align: center;
        }}
    </style>
</head>
<body>
<div class="container">
    <h1>Herakles Target Monitor</h1>
    <p class="subtitle">Per-application up/down status for Prometheus scrape targets</p>

    <div class="info">
        <div class="info-item">
            <span class="info-label">Version</span>
            <span class="info-value">{version}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Uptime</span>
            <span class="info-value">{uptime}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Backend</span>
            <span class="info-value">{backend}</span>
        </div>
    </div>

    <h2>Applications</h2>
    <table>
        <thead><tr><th>Application</th><th>Instance</th><th>Address</th><th>Status</th><th>Since</th><th>Duration</th></tr></thead>
        <tbody id="apps"><tr><td colspan="6">waiting for first update…</td></tr></tbody>
    </table>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
{endpoints}    </ul>

    <div class="footer">
        <p>{footer}</p>
    </div>
</div>
<script>
    const source = new EventSource("{prefix}/event");
    const board = document.getElementById("apps");
    const row = (cells, status) => {{
        const tr = document.createElement("tr");
        cells.forEach((text, n) => {{
            const td = document.createElement("td");
            td.textContent = text;
            if (n === 3 && status) td.className = status;
            tr.appendChild(td);
        }});
        return tr;
    }};
    const notice = (text) => {{
        const tr = document.createElement("tr");
        const td = document.createElement("td");
        td.colSpan = 6;
        td.textContent = text;
        tr.appendChild(td);
        board.replaceChildren(tr);
    }};
    source.onmessage = (e) => {{
        const data = JSON.parse(e.data);
        const rows = [];
        for (const app of data.apps) {{
            for (const i of app.instances) {{
                const status = ["UP", "DOWN", "UNKNOWN"].includes(i.status) ? i.status : "";
                rows.push(row([app.name, i.name, i.addr, i.status, i.time, i.duration], status));
            }}
        }}
        if (rows.length) board.replaceChildren(...rows);
        else notice("no targets");
    }};
    source.addEventListener("error", (e) => {{
        if (e.data) notice(e.data);
    }});
</script>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        backend = backend,
        endpoints = endpoints,
        prefix = prefix,
        footer = FOOTER_TEXT
    )
}
