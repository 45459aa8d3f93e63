//! Static file serving module
//!
//! Resolves a request path against the root directory and serves the file,
//! a directory index, a listing, a redirect or a 404.

use crate::handler::listing;
use crate::handler::path::translate_path;
use crate::handler::router::RequestContext;
use crate::http::{self, date, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Index files tried, in order, when a directory is requested
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Serve whatever the request path maps to under `root`
pub async fn serve(ctx: &RequestContext<'_>, root: &Path) -> Response<Full<Bytes>> {
    let Some(resolved) = translate_path(root, ctx.path) else {
        return http::build_404_response("File not found", ctx.is_head);
    };
    let mut file_path = resolved.fs_path;

    if is_dir(&file_path).await {
        if !ctx.path.ends_with('/') {
            return http::build_redirect_response(&directory_location(ctx.path, ctx.query));
        }
        match find_index(&file_path).await {
            Some(index) => file_path = index,
            None => return listing::serve_listing(&file_path, ctx.path, ctx.is_head).await,
        }
    } else if resolved.trailing_slash {
        return http::build_404_response("File not found", ctx.is_head);
    }

    serve_file(ctx, &file_path).await
}

/// Serve a single regular file, honouring `If-Modified-Since`
async fn serve_file(ctx: &RequestContext<'_>, file_path: &Path) -> Response<Full<Bytes>> {
    let Ok(mut file) = fs::File::open(file_path).await else {
        return http::build_404_response("File not found", ctx.is_head);
    };

    let metadata = match file.metadata().await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return http::build_404_response("File not found", ctx.is_head),
        Err(e) => return read_failure(file_path, &e, ctx.is_head),
    };
    let modified = metadata.modified().ok();

    if let (Some(modified), Some(since)) = (modified, ctx.if_modified_since()) {
        if date::not_modified_since(modified, &since) {
            return http::build_304_response();
        }
    }

    let mut content = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or(0));
    if !ctx.is_head {
        if let Err(e) = file.read_to_end(&mut content).await {
            return read_failure(file_path, &e, ctx.is_head);
        }
    }

    let last_modified = modified.map(date::format_http_date).unwrap_or_default();
    let mut response = http::build_file_response(
        Bytes::from(content),
        mime::guess_content_type(file_path),
        &last_modified,
        ctx.is_head,
    );
    if ctx.is_head {
        // Body was never read; advertise the size on disk
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_LENGTH, metadata.len().into());
    }
    response
}

fn read_failure(file_path: &Path, err: &std::io::Error, is_head: bool) -> Response<Full<Bytes>> {
    logger::log_error(&format!(
        "Failed to read file '{}': {err}",
        file_path.display()
    ));
    http::build_error_response(StatusCode::INTERNAL_SERVER_ERROR, None, is_head)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn find_index(dir: &Path) -> Option<PathBuf> {
    for name in INDEX_FILES {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// Redirect target for a directory requested without its trailing slash
fn directory_location(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{path}/?{q}"),
        None => format!("{path}/"),
    }
}
