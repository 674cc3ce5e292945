//! Server-rendered pages. Everything interpolated here is either a number or
//! the configured currency symbol, which is escaped.

use std::fmt::Write;

use crate::models::{ValuationResult, POSITION_COUNT};

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;}\
table{border-collapse:collapse;}\
th,td{border:1px solid #ccc;padding:.4rem .8rem;text-align:right;}\
th:first-child,td:first-child{text-align:left;}\
.gain{color:#1a7f37;}.loss{color:#cf222e;}";

fn escape(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn money(symbol: &str, amount: f64) -> String {
    if amount < 0.0 {
        format!("-{symbol}{:.2}", -amount)
    } else {
        format!("{symbol}{amount:.2}")
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

pub fn login_page() -> String {
    layout(
        "Login",
        "<h1>Login</h1>\n\
         <form method=\"post\" action=\"/login\">\n\
         <label>Password <input type=\"password\" name=\"password\" autofocus></label>\n\
         <button type=\"submit\">Log in</button>\n\
         </form>",
    )
}

pub fn index_page(valuation: &ValuationResult, currency_symbol: &str) -> String {
    let symbol = escape(currency_symbol);
    let mut rows = String::new();

    for i in 0..POSITION_COUNT {
        let n = i + 1;
        let Some(initial) = valuation.initial_investment[i] else {
            let _ = writeln!(
                rows,
                "<tr id=\"position-{n}\"><td>Investment {n}</td><td colspan=\"4\">-</td></tr>"
            );
            continue;
        };
        let profit = valuation.profit_loss[i];
        let class = if profit < 0.0 { "loss" } else { "gain" };
        let _ = writeln!(
            rows,
            "<tr id=\"position-{n}\"><td>Investment {n}</td>\
             <td class=\"initial_investment\">{}</td>\
             <td class=\"shares\">{:.4}</td>\
             <td class=\"new_investment\">{}</td>\
             <td class=\"profit_loss {class}\">{}</td></tr>",
            money(&symbol, initial),
            valuation.shares[i],
            money(&symbol, valuation.new_investment[i]),
            money(&symbol, profit),
        );
    }

    let total_class = if valuation.total_profit_loss < 0.0 { "loss" } else { "gain" };
    let body = format!(
        "<h1>Investment tracker</h1>\n\
         <p>S&amp;P 500 price: <strong id=\"sp500_price\">{price}</strong></p>\n\
         <table>\n\
         <tr><th>Position</th><th>Initial investment</th><th>Shares</th>\
         <th>Current value</th><th>Profit / loss</th></tr>\n\
         {rows}\
         <tr id=\"totals\"><td>Total</td><td>{invested}</td><td></td><td>{value}</td>\
         <td class=\"{total_class}\">{profit}</td></tr>\n\
         </table>\n\
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>",
        price = money(&symbol, valuation.sp500_price),
        invested = money(&symbol, valuation.total_invested),
        value = money(&symbol, valuation.total_value),
        profit = money(&symbol, valuation.total_profit_loss),
    );

    layout("Investment tracker", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation() -> ValuationResult {
        ValuationResult {
            record_id: 1,
            initial_investment: [Some(1000.0), Some(500.0), None, None],
            shares: [10.0, 5.0, 0.0, 0.0],
            new_investment: [900.0, 450.0, 0.0, 0.0],
            profit_loss: [-100.0, -50.0, 0.0, 0.0],
            sp500_price: 90.0,
            total_invested: 1500.0,
            total_value: 1350.0,
            total_profit_loss: -150.0,
        }
    }

    #[test]
    fn test_index_page_shows_every_figure() {
        let html = index_page(&valuation(), "₪");

        assert!(html.contains("₪1000.00"));
        assert!(html.contains("10.0000"));
        assert!(html.contains("₪900.00"));
        assert!(html.contains("-₪100.00"));
        assert!(html.contains("<strong id=\"sp500_price\">₪90.00</strong>"));
        assert!(html.contains("<tr id=\"position-3\"><td>Investment 3</td><td colspan=\"4\">-</td></tr>"));
        assert!(html.contains("class=\"loss\">-₪150.00"));
    }

    #[test]
    fn test_currency_symbol_is_escaped() {
        let html = index_page(&valuation(), "<b>");
        assert!(html.contains("&lt;b&gt;1000.00"));
        assert!(!html.contains("<b>1000.00"));
    }

    #[test]
    fn test_login_page_posts_password() {
        let html = login_page();
        assert!(html.contains("action=\"/login\""));
        assert!(html.contains("name=\"password\""));
    }
}
