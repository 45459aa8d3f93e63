//! Generated directory listing pages

use crate::handler::path::quote_path;
use crate::http::{self, response::escape_html};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Serve a listing of `dir`, titled with the decoded request path
pub async fn serve_listing(dir: &Path, request_path: &str, is_head: bool) -> Response<Full<Bytes>> {
    match read_entries(dir).await {
        Ok(entries) => {
            let display_path = urlencoding::decode_binary(request_path.as_bytes());
            let display_path = String::from_utf8_lossy(&display_path);
            http::build_html_response(render_listing(&display_path, &entries), is_head)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot list directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response("No permission to list directory", is_head)
        }
    }
}

/// Read directory entries, sorted case-insensitively by name
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut read_dir = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        // metadata follows symlinks, so a link to a directory lists as one
        let is_dir = fs::metadata(&path).await.is_ok_and(|m| m.is_dir());
        let is_symlink = fs::symlink_metadata(&path)
            .await
            .is_ok_and(|m| m.file_type().is_symlink());

        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Render the listing page
pub fn render_listing(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));

    let mut lines = vec![
        "<!DOCTYPE HTML>".to_string(),
        "<html lang=\"en\">".to_string(),
        "<head>".to_string(),
        "<meta charset=\"utf-8\">".to_string(),
        "<style type=\"text/css\">\n:root {\ncolor-scheme: light dark;\n}\n</style>\n".to_string(),
        format!("<title>{title}</title>\n</head>"),
        format!("<body>\n<h1>{title}</h1>"),
        "<hr>\n<ul>".to_string(),
    ];

    for entry in entries {
        let mut display_name = entry.name.clone();
        let mut link_name = entry.name.clone();
        if entry.is_dir {
            display_name.push('/');
            link_name.push('/');
        }
        if entry.is_symlink {
            display_name = format!("{}@", entry.name);
        }
        lines.push(format!(
            "<li><a href=\"{}\">{}</a></li>",
            quote_path(&link_name),
            escape_html(&display_name)
        ));
    }

    lines.push("</ul>\n<hr>\n</body>\n</html>\n".to_string());
    lines.join("\n")
}
