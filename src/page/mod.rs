//! Page Rendering
//!
//! Server-side rendering of the public price list page. The markup carries
//! one editable field per catalog item; a small inline script drives a form
//! session through the JSON API.

mod script;

use crate::catalog::{section_title, PriceCatalog};
use crate::form::{format_amount, FormConfig};

const FEATURES: [(&str, &str, &str); 3] = [
    (
        "📅",
        "Precios Actualizados",
        "Información verificada directamente con las clínicas locales.",
    ),
    (
        "⚖️",
        "Comparativas Reales",
        "Compara costos entre diferentes centros médicos de tu ciudad.",
    ),
    (
        "⚡",
        "Gestión Directa",
        "Solicita citas o información adicional con un solo clic.",
    ),
];

const STYLE: &str = r#"
body{margin:0;font-family:system-ui,sans-serif;color:#1e293b;background:#f8fafc}
nav{position:sticky;top:0;display:flex;justify-content:space-between;align-items:center;padding:1rem 2rem;background:rgba(255,255,255,.85);backdrop-filter:blur(8px)}
nav a,.primary{background:#0ea5e9;color:#fff;border:0;border-radius:999px;padding:.5rem 1.25rem;text-decoration:none;font-weight:600}
.brand span{color:#0ea5e9}
main{max-width:72rem;margin:0 auto;padding:2rem 1.5rem}
.hero{text-align:center;padding:4rem 0}
.features{display:grid;gap:1.5rem;grid-template-columns:repeat(auto-fit,minmax(16rem,1fr))}
.card{background:#fff;border-radius:1.5rem;padding:2rem;box-shadow:0 10px 30px rgba(15,23,42,.08)}
.section{background:#fff;border-radius:1.5rem;margin:2rem 0;overflow:hidden;box-shadow:0 10px 30px rgba(15,23,42,.08)}
.section h3{margin:0;padding:1rem 2rem;text-transform:capitalize;color:#0ea5e9;background:#f0f9ff}
table{width:100%;border-collapse:collapse}
th,td{padding:.75rem 2rem;text-align:left;border-top:1px solid #e2e8f0}
td.code{font-family:monospace;color:#64748b}
input[data-code]{width:9rem;padding:.5rem;border:1px solid #cbd5e1;border-radius:.75rem}
.actions{position:sticky;bottom:2rem;display:flex;flex-direction:column;align-items:center;gap:1rem;margin-top:2rem}
.primary:disabled{background:#cbd5e1;cursor:not-allowed}
#estado{border-radius:999px;padding:.5rem 1.5rem;color:#fff}
#estado.success{background:#22c55e}
#estado.error{background:#ef4444}
footer{text-align:center;color:#94a3b8;padding:3rem 0}
"#;

/// Render the full page
pub fn render_index(catalog: &PriceCatalog, config: &FormConfig) -> String {
    let mut html = String::with_capacity(32 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Precios Clínica</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str(
        "<nav><span class=\"brand\"><strong>Precios<span>Clínica</span></strong></span>\
         <a href=\"#tarifas\">Ver Tarifas</a></nav>\n<main>\n",
    );

    html.push_str(
        "<section class=\"hero\">\
         <p>Transparencia total en servicios de salud</p>\
         <h1>¡Hola mami! ❤️</h1>\
         <p>Aquí tienes que actualizar los precios de los procedimientos de la clínica. \
         Consulta las tarifas oficiales y ajusta lo que necesites fácilmente.</p>\
         </section>\n",
    );

    html.push_str("<section class=\"features\">");
    for (icon, title, desc) in FEATURES {
        html.push_str(&format!(
            "<div class=\"card\"><div>{}</div><h3>{}</h3><p>{}</p></div>",
            icon, title, desc
        ));
    }
    html.push_str("</section>\n");

    render_tariffs(&mut html, catalog, config);

    html.push_str("</main>\n<footer>© 2026 Precios Clínica. Todos los derechos reservados.</footer>\n");
    html.push_str(&format!(
        "<script>const STATUS_RESET_MS = {};\n{}</script>\n",
        config.status_reset.as_millis(),
        script::FORM_SCRIPT
    ));
    html.push_str("</body>\n</html>\n");

    html
}

fn render_tariffs(html: &mut String, catalog: &PriceCatalog, config: &FormConfig) {
    html.push_str(
        "<section id=\"tarifas\"><h2>Listado de Tarifas 2025</h2>\
         <p>Consulta y ajusta los precios de los servicios odontológicos.</p>\n",
    );

    for (key, items) in catalog.sections() {
        html.push_str(&format!(
            "<div class=\"section\"><h3>{}</h3><table><thead><tr>\
             <th>Código</th><th>Servicio</th><th>Precio Base (CRC)</th><th>Nuevo Precio</th>\
             </tr></thead><tbody>",
            escape_html(&section_title(key))
        ));

        for item in items {
            let code = escape_html(&item.code);
            html.push_str(&format!(
                "<tr><td class=\"code\">{code}</td><td>{}</td><td>₡{}</td>\
                 <td>₡ <input type=\"text\" inputmode=\"numeric\" placeholder=\"Nuevo monto\" \
                 data-code=\"{code}\" aria-label=\"Nuevo precio {code}\"></td></tr>",
                escape_html(&item.name),
                format_amount(item.base_price, config.locale),
            ));
        }

        html.push_str("</tbody></table></div>\n");
    }

    html.push_str(
        "<div class=\"actions\"><div id=\"estado\" hidden></div>\
         <button id=\"enviar\" class=\"primary\" disabled>Enviar Actualizaciones</button></div>\
         </section>\n",
    );
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
