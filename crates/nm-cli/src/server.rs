//! Serve loop: one request per input line, responses as JSON lines.
//!
//! Requests are handled strictly in order against a single engine owned by
//! the loop. A bad line is logged and skipped; only `exit`, end of input or
//! Ctrl-C stop the loop.

use anyhow::{Context, Result};
use nm_core::{Kind, ReasoningEngine, export_value, understand};
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{Message, ProtocolError, Request, Response, decode};

/// What the loop should do after a message.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Continue(Vec<Response>),
    Exit,
}

/// Decode and run one protocol line.
pub fn handle_line(engine: &mut ReasoningEngine, line: &str) -> Result<Outcome, ProtocolError> {
    let message = decode(line)?;
    dispatch(engine, message)
}

/// Run one decoded request against the engine.
pub fn dispatch(engine: &mut ReasoningEngine, message: Message) -> Result<Outcome, ProtocolError> {
    let Message { id, request } = message;
    let mut responses = Vec::new();

    match request {
        Request::Learn { symbol, meaning } => {
            // an empty symbol learns nothing but is still confirmed
            let advisory = engine.learn(&symbol, &meaning);
            if engine.knows(&symbol) {
                tracing::info!("Aprendido: {symbol} = {meaning}");
            }
            if let Some(advisory) = advisory {
                responses.push(Response::answer(advisory, None)?);
            }
            responses.push(Response::answer(format!("Símbolo aprendido: {symbol}"), id)?);
        }
        Request::Explain { symbol } => {
            responses.push(Response::answer(engine.explain(&symbol), id)?);
        }
        Request::Resonance {
            symbol,
            intensity,
            context,
        } => {
            tracing::info!("Resonancia: {symbol} (intensidad={intensity}) en '{context}'");
            let label = engine.resonate(&symbol, intensity, &context);
            responses.push(Response::answer(label, id)?);
        }
        Request::Suggest { symbol } => match engine.suggest(&symbol) {
            Some(suggestion) => responses.push(Response::suggestion(suggestion, id)?),
            None => tracing::info!("Sin sugerencias para {symbol}"),
        },
        Request::Rules => {
            for symbol in engine.apply_rules() {
                tracing::info!("{symbol} es meta");
            }
        }
        Request::MergeMemory(remote) => {
            tracing::info!("Fusionando memoria remota ({} símbolos)", remote.len());
            let summary = engine.merge(remote);
            for symbol in &summary.imported {
                tracing::info!("Importado símbolo nuevo: {symbol}");
            }
            tracing::debug!("reconciled existing symbols: {:?}", summary.updated);
            tracing::info!("Memoria fusionada.");
        }
        Request::InterpretBlock { symbol, payload } => {
            let block = engine.interpret_block(&symbol, Some(&payload));
            responses.push(Response::answer(block, id)?);
        }
        Request::Understand { text } => {
            responses.push(Response::answer(understand(&text), id)?);
        }
        Request::Tag { symbol, kind } => {
            let Some(kind) = Kind::parse(&kind) else {
                return Err(ProtocolError::InvalidField {
                    field: "tipo",
                    reason: "must not be empty".to_string(),
                });
            };
            if !engine.tag(&symbol, kind.clone()) {
                return Err(ProtocolError::InvalidField {
                    field: "symbol",
                    reason: "must not be empty".to_string(),
                });
            }
            responses.push(Response::answer(
                format!("Símbolo etiquetado: {symbol} (tipo: {kind})"),
                id,
            )?);
        }
        Request::Dictionary(entries) => {
            let learned = engine.seed_dictionary(&entries);
            tracing::info!("Aprendidos {learned} símbolos del diccionario externo");
            responses.push(Response::answer(json!({ "aprendidos": learned }), id)?);
        }
        Request::Knows { symbol } => {
            responses.push(Response::answer(engine.knows(&symbol), id)?);
        }
        Request::ExportMemory => {
            responses.push(Response::answer(export_value(engine.store())?, id)?);
        }
        Request::State => {
            responses.push(Response::answer(engine.state(), id)?);
        }
        Request::Exit => return Ok(Outcome::Exit),
    }

    Ok(Outcome::Continue(responses))
}

/// A bare `exit`/`quit` line (not JSON) also ends the session.
fn is_quit_line(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

async fn write_response<W: AsyncWrite + Unpin>(output: &mut W, response: &Response) -> Result<()> {
    let mut line = response.encode().context("failed to encode response")?;
    line.push('\n');
    output
        .write_all(line.as_bytes())
        .await
        .context("failed to write response")?;
    output.flush().await.context("failed to flush output")
}

/// Serve requests from `input` until exit, end of input or Ctrl-C.
pub async fn serve<R, W>(engine: &mut ReasoningEngine, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!("NodeMind activo. Lista para razonar.");

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            read = input.read_until(b'\n', &mut buf) => read.context("failed to read input")?,
            _ = &mut interrupt => {
                tracing::info!("interrupted");
                break;
            }
        };
        if read == 0 {
            tracing::debug!("end of input");
            break;
        }

        // invalid UTF-8 degrades to a malformed line instead of ending the loop
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_quit_line(line) {
            break;
        }

        match handle_line(engine, line) {
            Ok(Outcome::Continue(responses)) => {
                for response in &responses {
                    write_response(&mut output, response).await?;
                }
            }
            Ok(Outcome::Exit) => break,
            Err(e) => tracing::warn!("error processing message: {e}"),
        }
    }

    tracing::info!("Entrando en modo reposo.");
    Ok(())
}
