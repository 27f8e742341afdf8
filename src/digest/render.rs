//! # Digest fragments
//! Pure HTML renderers, one per section. No store or network access here.

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;

use crate::ingest::providers::weather::{bearing_to_cardinal, mps_to_mph, round2, Compass};
use crate::ingest::types::{Article, CurrentEvents, ForecastPoint, JourneyInfo, SocialPost};

/// Rendered instead of an empty Travel section.
pub const NO_TRAVEL_UPDATES: &str = "<b> No recent relevant travel updates </b>";

/// Compatibility shim: the news API has shipped the source name under both
/// spellings. Checked in order.
pub const SOURCE_NAME_FIELDS: &[&str] = &["name", "Name"];

/// A forecast point matched for one configured area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaForecast {
    pub area: String,
    /// Point time converted to the local timezone.
    pub local_time: NaiveDateTime,
    pub point: ForecastPoint,
}

/// `goodge_street` → `Goodge Street`
pub fn area_label(area: &str) -> String {
    area.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn weather_fragment(forecasts: &[AreaForecast]) -> String {
    forecasts
        .iter()
        .map(area_weather)
        .collect::<Vec<_>>()
        .join("<br>")
}

fn area_weather(f: &AreaForecast) -> String {
    let p = &f.point;
    let direction = match bearing_to_cardinal(p.wind_direction_from10m) {
        Some(c @ Compass::Cardinal(_)) => format!(" from the {c}"),
        Some(Compass::Invalid) => format!(" ({})", Compass::Invalid),
        None => String::new(),
    };
    format!(
        "<b>Time</b>: {time} -- <b>{area}</b><br>\n\
         Temperature: {temp}\u{00b0}C<br>\n\
         Wind Speed: {wind} mph{direction}.<br>\n\
         Chance of precipitation: {prob}%<br>\n\
         Rate of precipitation: {rate} mm/hour<br>\n\
         <hr>\n",
        time = f.local_time.format("%d %b %H:%M %p"),
        area = encode_text(&area_label(&f.area)),
        temp = round2(p.screen_temperature),
        wind = mps_to_mph(p.wind_speed10m),
        prob = p.prob_of_precipitation,
        rate = p.precipitation_rate,
    )
}

pub fn journey_fragment(journey: &JourneyInfo) -> String {
    match journey.travel_time.travel_time_minutes {
        None => "Failed to get journey time information.<br>\n".to_string(),
        Some(minutes) => format!(
            "{} to {} expected to take <b>{minutes} minutes.</b><br>\n",
            encode_text(&area_label(&journey.start)),
            encode_text(&area_label(&journey.end)),
        ),
    }
}

/// `Sun Oct 18 07:12:00 +0000 2026` → `Oct 18 07:12` in `tz`; raw text if unparseable.
pub fn post_time(created_at: &str, tz: Tz) -> String {
    DateTime::parse_from_str(created_at, "%a %b %d %H:%M:%S %z %Y")
        .map(|t| t.with_timezone(&tz).format("%b %d %H:%M").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

pub fn posts_fragment(posts: &[SocialPost], tz: Tz) -> String {
    if posts.is_empty() {
        return NO_TRAVEL_UPDATES.to_string();
    }
    let bodies: Vec<String> = posts
        .iter()
        .map(|p| {
            format!(
                "<b> {} </b><br>\n{} <br>\n",
                encode_text(&post_time(&p.created_at, tz)),
                encode_text(&p.full_text)
            )
        })
        .collect();
    bodies.join("<br>") + "\n<hr>"
}

/// Empty when nothing is stored for today; the section is then omitted.
pub fn current_events_fragment(events: Option<&CurrentEvents>) -> String {
    let Some(ev) = events else {
        return String::new();
    };
    format!(
        "<h2 style=\"font-size:20px;\">Current Events - {}</h2> <br>\n<hr>\n{}",
        encode_text(&ev.date),
        ev.text
    )
}

/// Source display name, tolerant of the `name`/`Name` spelling drift.
pub fn source_name(source: &Value) -> Option<&str> {
    match source {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => SOURCE_NAME_FIELDS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str)),
        _ => None,
    }
}

/// `2026-10-18T07:00:00Z` → `2026-10-18 07:00:00`
pub fn publish_time(published_at: &str) -> String {
    published_at.replace('T', " ").replace('Z', "").trim().to_string()
}

pub fn news_fragment(articles: &[Article]) -> String {
    let mut body = String::new();
    for a in articles {
        let title = encode_text(&a.title);
        let headline = match a.url.as_deref() {
            Some(url) => format!(
                "<a href=\"{}\"><b>{title}</b></a><br>",
                encode_double_quoted_attribute(url)
            ),
            None => format!("<b>{title}</b><br>"),
        };
        body.push_str(&format!(
            "{headline}\n<i>Source: {}, {}</i><br><br>\n",
            encode_text(source_name(&a.source).unwrap_or("Unknown source")),
            encode_text(&publish_time(&a.published_at)),
        ));
    }
    body + "\n<hr>"
}

/// Rendered sections, assembled by [`page`].
#[derive(Debug, Clone, Default)]
pub struct Sections {
    pub weather: String,
    pub travel: String,
    pub current_events: String,
    pub news: String,
}

const H2: &str = "<h2 style=\"font-size:20px;\">";

pub fn page(s: &Sections) -> String {
    format!(
        "<html>\n  <body>\n    <p style=\"color:black;\">\n\
         {H2}Weather</h2> <br>\n{weather} <br>\n\
         {H2}Travel</h2> <br>\n{travel} <br>\n\
         {current} <br>\n\
         {H2}Latest Headlines</h2> <br>\n{news} <br>\n\
         </p>\n  </body>\n</html>\n",
        weather = s.weather,
        travel = s.travel,
        current = s.current_events,
        news = s.news,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn point() -> ForecastPoint {
        ForecastPoint {
            time: "2026-01-05T08:00Z".into(),
            screen_temperature: 15.456,
            wind_speed10m: 5.0,
            wind_direction_from10m: Some(90.0),
            prob_of_precipitation: 20.0,
            precipitation_rate: 0.1,
        }
    }

    #[test]
    fn area_labels() {
        assert_eq!(area_label("goodge_street"), "Goodge Street");
        assert_eq!(area_label("area_x"), "Area X");
    }

    #[test]
    fn weather_fragment_formats_values() {
        let f = AreaForecast {
            area: "area_x".into(),
            local_time: NaiveDateTime::parse_from_str("2026-01-05 08:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            point: point(),
        };
        let html = weather_fragment(&[f]);
        assert!(html.contains("05 Jan 08:00 AM -- <b>Area X</b>"), "{html}");
        assert!(html.contains("Temperature: 15.46°C"), "{html}");
        assert!(html.contains("11.18 mph from the East"), "{html}");
        assert!(html.contains("Chance of precipitation: 20%"), "{html}");
        assert!(html.contains("Rate of precipitation: 0.1 mm/hour"), "{html}");
    }

    #[test]
    fn weather_without_bearing_has_no_direction() {
        let mut p = point();
        p.wind_direction_from10m = None;
        let f = AreaForecast {
            area: "a".into(),
            local_time: NaiveDateTime::default(),
            point: p,
        };
        assert!(weather_fragment(&[f]).contains("Wind Speed: 11.18 mph.<br>"));
    }

    #[test]
    fn empty_posts_render_fixed_notice() {
        let html = posts_fragment(&[], chrono_tz::UTC);
        assert_eq!(html, NO_TRAVEL_UPDATES);
        assert!(!html.is_empty());
    }

    #[test]
    fn posts_are_escaped_and_timed() {
        let post = SocialPost {
            id: 1,
            created_at: "Sun Oct 18 07:12:00 +0000 2026".into(),
            full_text: "Northern Line: <minor> delays".into(),
            extra: Map::new(),
        };
        let html = posts_fragment(&[post], chrono_tz::UTC);
        assert!(html.contains("<b> Oct 18 07:12 </b>"), "{html}");
        assert!(html.contains("Northern Line: &lt;minor&gt; delays"), "{html}");
        assert!(html.ends_with("<hr>"));
    }

    #[test]
    fn post_time_falls_back_to_raw() {
        assert_eq!(post_time("whenever", chrono_tz::UTC), "whenever");
    }

    #[test]
    fn source_name_aliases() {
        assert_eq!(source_name(&json!({"id": "bbc-news", "name": "BBC News"})), Some("BBC News"));
        assert_eq!(source_name(&json!({"Name": "Reuters"})), Some("Reuters"));
        assert_eq!(source_name(&json!({"id": "x"})), None);
        assert_eq!(source_name(&Value::Null), None);
    }

    #[test]
    fn news_links_only_with_url() {
        let mut with_url = Article {
            title: "Markets & more".into(),
            source: json!({"Name": "Reuters"}),
            url: Some("https://example.com/a?b=1&c=2".into()),
            published_at: "2026-10-18T07:00:00Z".into(),
            extra: Map::new(),
        };
        let html = news_fragment(std::slice::from_ref(&with_url));
        assert!(html.contains("<a href=\"https://example.com/a?b=1&amp;c=2\"><b>Markets &amp; more</b></a>"), "{html}");
        assert!(html.contains("Source: Reuters, 2026-10-18 07:00:00"), "{html}");

        with_url.url = None;
        let html = news_fragment(&[with_url]);
        assert!(html.starts_with("<b>Markets &amp; more</b><br>"), "{html}");
        assert!(!html.contains("<a "));
    }

    #[test]
    fn missing_current_events_is_empty() {
        assert_eq!(current_events_fragment(None), "");
        let ev = CurrentEvents {
            id: 20261018,
            date: "18 Oct 2026".into(),
            text: "<ul><li>x</li></ul>".into(),
        };
        let html = current_events_fragment(Some(&ev));
        assert!(html.contains("Current Events - 18 Oct 2026"));
        assert!(html.ends_with("<ul><li>x</li></ul>"));
    }

    #[test]
    fn page_orders_sections() {
        let html = page(&Sections {
            weather: "W".into(),
            travel: "T".into(),
            current_events: "C".into(),
            news: "N".into(),
        });
        let w = html.find("Weather</h2>").unwrap();
        let t = html.find("Travel</h2>").unwrap();
        let c = html.find("\nC <br>").unwrap();
        let n = html.find("Latest Headlines</h2>").unwrap();
        assert!(w < t && t < c && c < n);
    }
}
