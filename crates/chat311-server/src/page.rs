//! HTML pages for the complaint form
//!
//! Every piece of user or model text is escaped before it reaches markup.

/// Warning shown when a request has no usable position
pub const MAP_WARNING: &str = "Unable to display location on map";

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
input[type=text]{width:100%;padding:.5rem}\
textarea{width:100%;height:22rem;font-family:monospace}\
.warning{background:#fff4d6;border-left:4px solid #e0a800;padding:.5rem 1rem}\
.error{background:#fde2e1;border-left:4px solid #d93025;padding:.5rem 1rem}\
iframe{width:100%;height:20rem;border:1px solid #ccc}";

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The bare form, optionally pre-filled
pub fn form_page(complaint: &str) -> String {
    layout(&form(complaint))
}

/// The form followed by a formatted service request
pub fn result_page(
    complaint: &str,
    formatted: &str,
    position: Option<(f64, f64)>,
    warnings: &[String],
) -> String {
    let mut body = form(complaint);
    body.push_str(&format!(
        "<label for=\"service-request\">Service Request</label>\n\
         <textarea id=\"service-request\" readonly>{}</textarea>\n",
        escape_html(formatted)
    ));

    match position {
        Some((lat, lon)) => body.push_str(&map_embed(lat, lon)),
        None => body.push_str(&warning(MAP_WARNING)),
    }
    for message in warnings {
        body.push_str(&warning(message));
    }

    layout(&body)
}

/// The form followed by an error message
pub fn error_page(complaint: &str, message: &str) -> String {
    let mut body = form(complaint);
    body.push_str(&format!("<p class=\"error\">{}</p>\n", escape_html(message)));
    layout(&body)
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Chat311</title>\n<style>{}</style>\n</head>\n<body>\n<h1>Chat311</h1>\n{}</body>\n</html>\n",
        STYLE, body
    )
}

fn form(complaint: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/\">\n\
         <label for=\"complaint\">Service Request Description</label>\n\
         <input type=\"text\" id=\"complaint\" name=\"complaint\" value=\"{}\" autofocus>\n\
         </form>\n",
        escape_html(complaint)
    )
}

fn warning(message: &str) -> String {
    format!("<p class=\"warning\">{}</p>\n", escape_html(message))
}

fn map_embed(lat: f64, lon: f64) -> String {
    const SPAN: f64 = 0.01;
    format!(
        "<iframe title=\"Request location\" src=\"https://www.openstreetmap.org/export/embed.html?bbox={},{},{},{}&amp;layer=mapnik&amp;marker={},{}\"></iframe>\n",
        lon - SPAN,
        lat - SPAN,
        lon + SPAN,
        lat + SPAN,
        lat,
        lon
    )
}
