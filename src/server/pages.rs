//! Pages Module
//!
//! アップロードページとマッピングページの最小限のHTML。
//! ページのスタイリングとテンプレートエンジンはこのリポジトリの
//! 対象外のため、インラインの静的マークアップで構成します。

/// アップロードページ
pub(crate) const UPLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>docxfill</title>
</head>
<body>
<h1>docxfill</h1>
<p>Upload a DOCX template and a spreadsheet, then map placeholders to columns.</p>
<form action="/upload" method="post" enctype="multipart/form-data">
  <p><label>Template (.docx): <input type="file" name="template_file" required></label></p>
  <p><label>Data (.xlsx): <input type="file" name="data_file" required></label></p>
  <p><button type="submit">Upload</button></p>
</form>
</body>
</html>
"#;

/// HTML特殊文字のエスケープ
fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
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

/// マッピングページを生成
///
/// プレースホルダごとに列の選択リストを表示し、送信時に
/// `/process`へJSON本文をPOSTしてアーカイブをダウンロードします。
/// `placeholders`と`columns`はソート済みの前提で、そのままの順序で
/// 表示されます。
pub(crate) fn mapping_page(run: &str, placeholders: &[String], columns: &[String]) -> String {
    let mut options = String::new();
    options.push_str("<option value=\"\">(not mapped)</option>");
    for column in columns {
        let escaped = escape_html(column);
        options.push_str("<option value=\"");
        options.push_str(&escaped);
        options.push_str("\">");
        options.push_str(&escaped);
        options.push_str("</option>");
    }

    let mut rows = String::new();
    for placeholder in placeholders {
        let escaped = escape_html(placeholder);
        rows.push_str("<tr><td><code>{{");
        rows.push_str(&escaped);
        rows.push_str("}}</code></td><td><select data-placeholder=\"");
        rows.push_str(&escaped);
        rows.push_str("\">");
        rows.push_str(&options);
        rows.push_str("</select></td></tr>\n");
    }

    let mut page = String::new();
    page.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>docxfill - mapping</title>
</head>
<body>
<h1>Map placeholders to columns</h1>
<table>
<tr><th>Placeholder</th><th>Column</th></tr>
"#,
    );
    page.push_str(&rows);
    page.push_str(
        r#"</table>
<p><button id="generate">Generate documents</button></p>
<p id="status"></p>
<script>
const RUN = ""#,
    );
    // 実行トークンは数字とハイフンのみ（検証済み）
    page.push_str(run);
    page.push_str(
        r#"";
document.getElementById("generate").addEventListener("click", async () => {
  const mapping = {};
  document.querySelectorAll("select[data-placeholder]").forEach((select) => {
    if (select.value) {
      mapping[select.dataset.placeholder] = select.value;
    }
  });
  const status = document.getElementById("status");
  status.textContent = "Rendering...";
  const response = await fetch("/process", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ mapping: mapping, run: RUN }),
  });
  if (!response.ok) {
    const body = await response.json();
    status.textContent = "Error: " + body.error;
    return;
  }
  const blob = await response.blob();
  const link = document.createElement("a");
  link.href = URL.createObjectURL(blob);
  link.download = RUN + ".zip";
  link.click();
  status.textContent = "Done.";
});
</script>
</body>
</html>
"#,
    );

    page
}
