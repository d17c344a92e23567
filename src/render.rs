//! Chat replies.

use log::{error, info};

use crate::exchange_rate::QuoteRecord;
use crate::query::{NoData, QueryCommand, QueryResult, QueryService, Scope};

pub const WELCOME: &str = "Bienvenido al bot de cotizaciones de bancos. \
Por favor, elija un banco (BNA, PROVINCIA, CIUDAD, BBVA) o escriba 'TODOS' para obtener todas las cotizaciones, \
seguido de la fecha en formato 'yyyy-mm-dd'. Por ejemplo, bna 2025-04-25.";

pub const NO_RESULTS: &str = "No se encontraron cotizaciones para ese criterio.";

pub const STORE_MISSING: &str =
    "Error: No se encontró el archivo de cotizaciones... Verifique el proceso de recolección...";

fn rate_lines(record: &QuoteRecord) -> String {
    match record.rates() {
        Some(rates) => format!("🔸 Compra: ${}\n🔹 Venta: ${}", rates.buy, rates.sell),
        None => format!("⚠️ {}", record.status()),
    }
}

/// The answer for a single bank.
pub fn render_single(record: &QuoteRecord) -> String {
    format!(
        "📅 Cotización del {} al {} {}:\n{}",
        record.source(),
        record.quote_date(),
        record.collected_at().format("%H:%M:%S"),
        rate_lines(record)
    )
}

/// One block of the all-banks answer.
pub fn render_block(record: &QuoteRecord) -> String {
    format!(
        "🏦 {} ({} {})\n{}",
        record.source(),
        record.quote_date(),
        record.collected_at().format("%H:%M:%S"),
        rate_lines(record)
    )
}

pub fn render(command: &QueryCommand, result: &QueryResult) -> String {
    match result {
        QueryResult::NoData(NoData::StoreUnavailable) => STORE_MISSING.to_string(),
        QueryResult::NoData(NoData::NoMatches) => NO_RESULTS.to_string(),
        QueryResult::Found(records) => match command.scope {
            Scope::Every => records
                .iter()
                .map(render_block)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Scope::Bank(_) | Scope::Any => records
                .iter()
                .map(render_single)
                .collect::<Vec<_>>()
                .join("\n\n"),
        },
    }
}

/// Answers one free-text message.
pub fn reply_to(service: &QueryService, text: &str) -> String {
    info!("Mensaje recibido: {}", text.trim());
    let Some(command) = QueryCommand::parse(text) else {
        return WELCOME.to_string();
    };

    match service.query(&command) {
        Ok(result) => render(&command, &result),
        Err(e) => {
            error!("Failed to read quote store: {e}");
            format!("Error al leer las cotizaciones: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange_rate::{Bank, RateValue, Rates, Status};
    use crate::store::QuoteStore;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use temp_dir::TempDir;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 25)
            .unwrap()
            .and_hms_opt(hour, 5, 9)
            .unwrap()
    }

    fn bna() -> QuoteRecord {
        QuoteRecord::success(
            Bank::Bna,
            at(10),
            "2025-04-25",
            Rates {
                buy: RateValue::Number(Decimal::new(118500, 2)),
                sell: RateValue::Number(Decimal::new(123500, 2)),
            },
        )
    }

    #[test]
    fn test_render_single() {
        assert_eq!(
            render_single(&bna()),
            "📅 Cotización del BNA al 2025-04-25 10:05:09:\n🔸 Compra: $1185.00\n🔹 Venta: $1235.00"
        );
    }

    #[test]
    fn test_render_all_banks() {
        let failed = QuoteRecord::failure(Bank::Bbva, at(11), Status::Error("down".to_string()));
        let command = QueryCommand::parse("TODOS").unwrap();
        let text = render(&command, &QueryResult::Found(vec![failed, bna()]));
        assert_eq!(
            text,
            "🏦 BBVA ( 11:05:09)\n⚠️ Error: down\n\n\
             🏦 BNA (2025-04-25 10:05:09)\n🔸 Compra: $1185.00\n🔹 Venta: $1235.00"
        );
    }

    #[test]
    fn test_reply_to_messages() {
        let dir = TempDir::new().unwrap();
        let store = QuoteStore::new(dir.path().join("quotes.csv"));
        let service = QueryService::new(store.clone());

        assert_eq!(reply_to(&service, "hola"), WELCOME);
        assert_eq!(reply_to(&service, "bna"), STORE_MISSING);

        store.append(&[bna()]).unwrap();
        assert_eq!(reply_to(&service, "ciudad"), NO_RESULTS);
        assert!(reply_to(&service, "bna 2025-04-25").contains("Compra: $1185.00"));
    }
}
