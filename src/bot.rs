//! HTTP front end for the query service.
//!
//! - `POST /telegram/webhook` answers Telegram updates inline with a
//!   `sendMessage` call, so the bot needs no outbound client.
//! - `GET /quotes?bank=BNA&date=2025-04-25` returns matching records as JSON.
//! - `GET /health` for liveness checks.

use actix_web::error::{ErrorBadRequest, ErrorInternalServerError};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, web};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::exchange_rate::Bank;
use crate::normalize::CANONICAL_DATE;
use crate::query::{QueryCommand, QueryResult, QueryService, Scope};
use crate::render::reply_to;
use crate::store::{QuoteRow, QuoteStore};

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Bot API method call returned as the webhook response body.
#[derive(Debug, Serialize)]
struct SendMessage {
    method: &'static str,
    chat_id: i64,
    text: String,
}

#[post("/telegram/webhook")]
async fn telegram_webhook(
    service: web::Data<QueryService>,
    update: web::Json<Update>,
) -> actix_web::Result<HttpResponse> {
    let update = update.into_inner();
    let Some(Message {
        chat,
        text: Some(text),
    }) = update.message
    else {
        debug!("Ignoring update {} without text", update.update_id);
        return Ok(HttpResponse::Ok().finish());
    };

    let reply = web::block(move || reply_to(&service, &text))
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(SendMessage {
        method: "sendMessage",
        chat_id: chat.id,
        text: reply,
    }))
}

#[derive(Debug, Deserialize)]
struct QuotesParams {
    bank: Option<String>,
    date: Option<String>,
}

impl QuotesParams {
    fn command(&self) -> Result<QueryCommand, String> {
        let scope = match self.bank.as_deref() {
            None => Scope::Every,
            Some(word) if word.eq_ignore_ascii_case(QueryCommand::ALL_KEYWORD) => Scope::Every,
            Some(word) => Bank::from_keyword(word)
                .map(Scope::Bank)
                .ok_or_else(|| format!("unknown bank {word:?}"))?,
        };
        let date = self
            .date
            .as_deref()
            .map(|text| {
                NaiveDate::parse_from_str(text, CANONICAL_DATE)
                    .map_err(|_| format!("date {text:?} is not YYYY-MM-DD"))
            })
            .transpose()?;
        Ok(QueryCommand { scope, date })
    }
}

#[get("/quotes")]
async fn quotes(
    service: web::Data<QueryService>,
    params: web::Query<QuotesParams>,
) -> actix_web::Result<HttpResponse> {
    let command = params.command().map_err(ErrorBadRequest)?;
    let result = web::block(move || service.query(&command))
        .await
        .map_err(ErrorInternalServerError)?
        .map_err(ErrorInternalServerError)?;

    let rows: Vec<QuoteRow> = match result {
        QueryResult::Found(records) => records.iter().map(QuoteRow::from).collect(),
        QueryResult::NoData(_) => Vec::new(),
    };
    Ok(HttpResponse::Ok().json(rows))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(telegram_webhook).service(quotes).service(health);
}

pub async fn serve(config: &Config) -> std::io::Result<()> {
    let service = web::Data::new(QueryService::new(QuoteStore::new(&config.data_file)));
    info!(
        "Serving quotes from {} on {}",
        config.data_file.display(),
        config.bind_addr
    );

    HttpServer::new(move || App::new().app_data(service.clone()).configure(configure))
        .bind(&config.bind_addr)?
        .run()
        .await
}
