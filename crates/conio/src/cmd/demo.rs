use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cmd::dump::{open_input, write_framed, Input};
use crate::cmd::restore::read_framed;
use crate::cmd::DemoArgs;
use crate::exit::{
    io_error, json_error, CliError, CliResult, DATA_INVALID, FAILURE, INTERNAL, SUCCESS,
};
use crate::output::{payload_preview, print_report, OutputFormat, Report};

/// Announces the size of the data about to be framed.
#[derive(Debug, Serialize, Deserialize)]
struct TxInfo {
    size: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TxResult {
    ok: bool,
    data: Vec<u8>,
}

pub fn run(args: DemoArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(args.input.as_deref())?;
    let (server, client) = loopback_pair()?;

    let report = exchange(server, client, input, args.compress)?;
    tracing::info!(
        bytes = report.received_bytes,
        chunks = report.chunks,
        "demo exchange complete"
    );
    print_report(&report, format);
    Ok(SUCCESS)
}

/// Connected pair of TCP streams standing in for a network connection.
fn loopback_pair() -> CliResult<(TcpStream, TcpStream)> {
    let listener =
        TcpListener::bind(("127.0.0.1", 0)).map_err(|err| io_error("bind failed", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| io_error("bind failed", err))?;
    let client = TcpStream::connect(addr).map_err(|err| io_error("connect failed", err))?;
    let (server, _) = listener
        .accept()
        .map_err(|err| io_error("accept failed", err))?;
    Ok((server, client))
}

/// Run the sending side on its own thread and the receiving side on this one.
///
/// Both sides talk JSON before and after the framed transfer on the same
/// stream, so the exchange only completes if the framing gives the stream
/// back exactly at the close marker.
pub fn exchange<S>(server: S, client: S, input: Input, compress: bool) -> CliResult<DemoReport>
where
    S: Read + Write + Send + 'static,
{
    let sender = thread::spawn(move || send(server, input, compress));

    let received = receive(client, compress);
    let sent = sender
        .join()
        .map_err(|_| CliError::new(INTERNAL, "sender thread panicked"))?;

    let (received_bytes, sender_reply) = received?;
    let (sent_bytes, chunks, receiver_reply) = sent?;

    Ok(DemoReport {
        sent_bytes,
        received_bytes,
        chunks,
        compressed: compress,
        sender_reply: payload_preview(&sender_reply),
        receiver_reply: payload_preview(&receiver_reply),
    })
}

fn send<S: Read + Write>(mut conn: S, mut input: Input, compress: bool) -> CliResult<(u64, u64, Vec<u8>)> {
    send_json(&mut conn, &TxInfo { size: input.size })?;

    let (_, stats) = write_framed(&mut input.reader, &mut conn, compress)?;
    tracing::debug!(bytes = stats.bytes, chunks = stats.chunks, "framed data sent");

    let confirmation: TxResult = recv_json(&mut conn)?;
    if !confirmation.ok {
        return Err(CliError::new(FAILURE, "receiver rejected the transfer"));
    }

    send_json(
        &mut conn,
        &TxResult {
            ok: true,
            data: vec![19, 91, 9, 16],
        },
    )?;
    let reply: TxResult = recv_json(&mut conn)?;
    tracing::debug!(reply = %payload_preview(&reply.data), "receiver responded");

    Ok((stats.bytes, stats.chunks, reply.data))
}

fn receive<S: Read + Write>(mut conn: S, compress: bool) -> CliResult<(u64, Vec<u8>)> {
    let info: TxInfo = recv_json(&mut conn)?;

    let mut data = Vec::new();
    let (_, received) = read_framed(&mut conn, &mut data, compress)?;
    if received != info.size {
        return Err(CliError::new(
            DATA_INVALID,
            format!("received {received} bytes, expected {}", info.size),
        ));
    }

    send_json(
        &mut conn,
        &TxResult {
            ok: true,
            data: Vec::new(),
        },
    )?;
    let message: TxResult = recv_json(&mut conn)?;
    send_json(
        &mut conn,
        &TxResult {
            ok: true,
            data: b"004".to_vec(),
        },
    )?;

    Ok((received, message.data))
}

fn send_json<W: Write, T: Serialize>(conn: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *conn, value).map_err(|err| json_error("send failed", err))?;
    conn.flush().map_err(|err| io_error("send failed", err))
}

/// Read one JSON object without consuming any byte past its closing brace.
fn recv_json<R: Read, T: DeserializeOwned>(conn: &mut R) -> CliResult<T> {
    serde_json::Deserializer::from_reader(conn)
        .into_iter::<T>()
        .next()
        .ok_or_else(|| CliError::new(FAILURE, "connection closed while waiting for message"))?
        .map_err(|err| json_error("receive failed", err))
}

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub sent_bytes: u64,
    pub received_bytes: u64,
    pub chunks: u64,
    pub compressed: bool,
    pub sender_reply: String,
    pub receiver_reply: String,
}

impl Report for DemoReport {
    fn columns(&self) -> Vec<&'static str> {
        vec![
            "SENT_BYTES",
            "RECEIVED_BYTES",
            "CHUNKS",
            "COMPRESSED",
            "SENDER_REPLY",
            "RECEIVER_REPLY",
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.sent_bytes.to_string(),
            self.received_bytes.to_string(),
            self.chunks.to_string(),
            self.compressed.to_string(),
            self.sender_reply.clone(),
            self.receiver_reply.clone(),
        ]]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn input_from(data: Vec<u8>) -> Input {
        Input {
            size: data.len() as u64,
            reader: Box::new(Cursor::new(data)),
            name: "<test>".to_string(),
        }
    }

    #[test]
    fn exchange_over_loopback() {
        let (server, client) = loopback_pair().unwrap();
        let report = exchange(server, client, open_input(None).unwrap(), false).unwrap();

        assert_eq!(report.sent_bytes, 4);
        assert_eq!(report.received_bytes, 4);
        assert_eq!(report.chunks, 1);
        assert_eq!(report.sender_reply, "\u{13}[\t\u{10}");
        assert_eq!(report.receiver_reply, "004");
    }

    #[test]
    fn compressed_exchange_over_loopback() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 13) as u8).collect();
        let (server, client) = loopback_pair().unwrap();
        let report = exchange(server, client, input_from(data), true).unwrap();

        assert_eq!(report.received_bytes, 200_000);
        assert!(report.compressed);
    }

    #[test]
    #[cfg(unix)]
    fn exchange_over_socket_pair() {
        let (server, client) = std::os::unix::net::UnixStream::pair().unwrap();
        let report = exchange(server, client, input_from(b"unix".to_vec()), false).unwrap();

        assert_eq!(report.received_bytes, 4);
        assert_eq!(report.receiver_reply, "004");
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let (server, client) = loopback_pair().unwrap();
        let mut input = input_from(b"short".to_vec());
        input.size = 99;

        let err = exchange(server, client, input, false)
            .err()
            .expect("size mismatch must fail");
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn recv_json_stops_at_closing_brace() {
        let mut wire = Cursor::new(br#"{"size":7}rest"#.to_vec());
        let info: TxInfo = recv_json(&mut wire).unwrap();

        assert_eq!(info.size, 7);
        let mut rest = String::new();
        wire.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "rest");
    }
}
