//! Placeholder Pages
//!
//! The two pages the starter ships with. Replace them with your own app.

use axum::http::StatusCode;
use axum::response::Html;

const HOME: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Plinth</title>
  <link rel="stylesheet" href="/assets/app.css">
</head>
<body>
  <main>
    <h1>Plinth</h1>
    <p>Your app starts here. Edit anything under the app root and the shell
    pushes the change over the live-reload channel.</p>
  </main>
  <script src="/assets/app.js"></script>
</body>
</html>
"#;

const NOT_FOUND: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Not Found</title>
  <link rel="stylesheet" href="/assets/app.css">
</head>
<body>
  <main>
    <h1>404</h1>
    <p>There is no page here. <a href="/">Back home</a>.</p>
  </main>
</body>
</html>
"#;

/// The home page
pub async fn home() -> Html<&'static str> {
    Html(HOME)
}

/// Fallback for every unknown route
pub async fn not_found() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND))
}
