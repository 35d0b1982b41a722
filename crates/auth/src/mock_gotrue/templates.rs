//! HTML templates for the mock consent page.

use html_escape::encode_double_quoted_attribute;

/// Fake Google sign-in page that posts back to the mock server.
pub fn login_page(redirect_to: &str, code_challenge: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Mock Google Sign In (DEV ONLY)</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, sans-serif;
            max-width: 400px;
            margin: 100px auto;
            padding: 20px;
        }}
        .warning {{
            background: #fff3cd;
            border: 1px solid #ffc107;
            padding: 15px;
            border-radius: 8px;
            margin-bottom: 20px;
        }}
        form {{
            background: #f8f9fa;
            padding: 20px;
            border-radius: 8px;
        }}
        label {{
            display: block;
            margin-bottom: 5px;
            font-weight: 500;
        }}
        input[type="email"], input[type="text"] {{
            width: 100%;
            padding: 10px;
            margin-bottom: 15px;
            border: 1px solid #ced4da;
            border-radius: 4px;
            box-sizing: border-box;
        }}
        button {{
            width: 100%;
            padding: 12px;
            background: #007bff;
            color: white;
            border: none;
            border-radius: 4px;
            font-size: 16px;
        }}
    </style>
</head>
<body>
    <div class="warning">
        <p>This is a <strong>mock Google login</strong>. Enter any email address.</p>
    </div>

    <form action="/auth/v1/authorize/submit" method="POST">
        <input type="hidden" name="redirect_to" value="{redirect_to}" />
        <input type="hidden" name="code_challenge" value="{code_challenge}" />

        <label for="email">Email Address</label>
        <input type="email" id="email" name="email" placeholder="dev@example.com" required />

        <label for="name">Name (optional)</label>
        <input type="text" id="name" name="name" placeholder="Dev User" />

        <button type="submit">Sign in with Google</button>
    </form>
</body>
</html>"#,
        redirect_to = encode_double_quoted_attribute(redirect_to),
        code_challenge = encode_double_quoted_attribute(code_challenge),
    )
}
