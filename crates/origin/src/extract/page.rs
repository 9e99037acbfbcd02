//! Detail pages of a single series or movie.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{element_text, image_source};
use crate::site::OriginSite;

static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.Title, h1.entry-title, .TPost h1").unwrap());
static DOC_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".Description p, .sinopsis p, .entry-content p").unwrap()
});
static POSTER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".TPostBg img, .post-thumbnail img, article img").unwrap()
});
static OG_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());
static DATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".Date, .year, time").unwrap());
static GENRE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".Genre a, .generos a, a[rel="category tag"]"#).unwrap()
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub year: Option<String>,
    pub genres: Vec<String>,
}

pub fn extract_details(body: &str, site: &OriginSite) -> PageDetails {
    let doc = Html::parse_document(body);

    let title = doc
        .select(&HEADING)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            doc.select(&DOC_TITLE)
                .next()
                .map(element_text)
                .and_then(|t| t.split('|').next().map(|s| s.trim().to_string()))
                .filter(|t| !t.is_empty())
        });

    let description = doc
        .select(&DESCRIPTION)
        .map(element_text)
        .find(|d| !d.is_empty());

    let poster_url = doc
        .select(&POSTER)
        .next()
        .and_then(image_source)
        .or_else(|| {
            doc.select(&OG_IMAGE)
                .next()
                .and_then(|m| m.value().attr("content"))
        })
        .and_then(|src| site.absolutize(src));

    let year = doc
        .select(&DATE)
        .next()
        .map(element_text)
        .and_then(|t| YEAR.find(&t).map(|m| m.as_str().to_string()));

    let mut genres: Vec<String> = Vec::new();
    for name in doc.select(&GENRE_LINK).map(element_text) {
        if !name.is_empty() && !genres.contains(&name) {
            genres.push(name);
        }
    }

    PageDetails {
        title,
        description,
        poster_url,
        year,
        genres,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn site() -> OriginSite {
        OriginSite::new(Url::parse("https://asialiveaction.com").unwrap()).unwrap()
    }

    #[test]
    fn reads_theme_detail_page() {
        let html = r#"
            <html><head><title>Queen of Tears | Asia Live Action</title></head>
            <body>
              <div class="TPostBg"><img data-src="/wp-content/uploads/qot-bg.jpg" src="data:,"></div>
              <article class="TPost">
                <h1 class="Title">Queen of Tears</h1>
                <span class="Date">Mar. 09, 2024</span>
                <div class="Description"><p></p><p>La reina de los grandes almacenes.</p></div>
                <p class="Genre"><a href="/genero/romance/">Romance</a>, <a href="/genero/drama/">Drama</a></p>
                <a rel="category tag" href="/category/drama/">Drama</a>
              </article>
            </body></html>"#;

        let details = extract_details(html, &site());
        assert_eq!(details.title.as_deref(), Some("Queen of Tears"));
        assert_eq!(
            details.description.as_deref(),
            Some("La reina de los grandes almacenes.")
        );
        assert_eq!(
            details.poster_url.as_deref(),
            Some("https://asialiveaction.com/wp-content/uploads/qot-bg.jpg")
        );
        assert_eq!(details.year.as_deref(), Some("2024"));
        assert_eq!(details.genres, vec!["Romance", "Drama"]);
    }

    #[test]
    fn falls_back_to_document_title_and_og_image() {
        let html = r#"
            <html><head>
              <title>My Demon | Asia Live Action</title>
              <meta property="og:image" content="https://cdn.example/md.jpg">
            </head><body><p>no theme markup</p></body></html>"#;

        let details = extract_details(html, &site());
        assert_eq!(details.title.as_deref(), Some("My Demon"));
        assert_eq!(details.poster_url.as_deref(), Some("https://cdn.example/md.jpg"));
        assert_eq!(details.description, None);
        assert_eq!(details.year, None);
        assert!(details.genres.is_empty());
    }

    #[test]
    fn empty_page_has_no_details() {
        assert_eq!(extract_details("", &site()), PageDetails::default());
    }
}
