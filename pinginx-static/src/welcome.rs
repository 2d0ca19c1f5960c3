/// Page shown for `/` when there is no file to serve
pub const WELCOME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Welcome to pinginx!</title>
<style>
    body {
        width: 35em;
        margin: 0 auto;
        font-family: Tahoma, Verdana, Arial, sans-serif;
    }
</style>
</head>
<body>
<h1>Welcome to pinginx!</h1>
<p>If you see this page, the pinginx server is successfully installed and
working. Further configuration is required.</p>

<p><em>Thank you for using pinginx.</em></p>
</body>
</html>
"#;

/// Content type of [`WELCOME_PAGE`]
pub const WELCOME_CONTENT_TYPE: &str = "text/html; charset=utf-8";
