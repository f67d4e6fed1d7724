use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use vcio::write_metrics;
use vcio_property::Mailbox;
use vcio_transport::MailboxTransport;

use crate::cmd::{Context, ServeArgs};
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS};

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPT_POLL: Duration = Duration::from_millis(100);

const METRICS_PATH: &str = "/metrics";
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Headers past this many lines are not read.
const MAX_HEADER_LINES: usize = 100;

/// Longest request or header line accepted, newline included.
const MAX_LINE_BYTES: u64 = 8192;

pub fn run(args: ServeArgs, ctx: &Context) -> CliResult<i32> {
    let mut mbox = ctx.open_mailbox()?;

    let listener = TcpListener::bind(&args.addr)
        .map_err(|err| io_error(&format!("unable to listen on {}", args.addr), err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| io_error("unable to configure listener", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(addr = %args.addr, path = METRICS_PATH, "serving metrics");

    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "connection accepted");
                if let Err(err) = serve_connection(stream, &mut mbox) {
                    warn!(%peer, error = %err, "request failed");
                }
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(err) => {
                warn!(error = %err, "accept failed");
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }

    info!("shutting down");
    mbox.close();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn serve_connection<T: MailboxTransport>(
    stream: TcpStream,
    mbox: &mut Mailbox<T>,
) -> io::Result<()> {
    // Accepted sockets inherit non-blocking mode from the listener on some platforms.
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    handle_request(reader, &mut writer, mbox)?;
    writer.flush()
}

/// Read one HTTP request from `reader` and write the response to `writer`.
fn handle_request<R, W, T>(mut reader: R, writer: &mut W, mbox: &mut Mailbox<T>) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    T: MailboxTransport,
{
    let request_line = match read_head(&mut reader) {
        Ok(Some(line)) => line,
        Ok(None) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            debug!(error = %err, "rejecting request");
            return write_response(
                writer,
                "400 Bad Request",
                TEXT_CONTENT_TYPE,
                &[],
                b"bad request\n",
            );
        }
        Err(err) => return Err(err),
    };

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default();
    debug!(method, path, "request");

    if path != METRICS_PATH {
        return write_response(writer, "404 Not Found", TEXT_CONTENT_TYPE, &[], b"not found\n");
    }
    if method != "GET" {
        return write_response(
            writer,
            "405 Method Not Allowed",
            TEXT_CONTENT_TYPE,
            &[("Allow", "GET")],
            b"method not allowed\n",
        );
    }

    let mut body = Vec::new();
    let report = write_metrics(mbox, &mut body)?;
    for failure in &report.failures {
        warn!(error = %failure, "gauge incomplete");
    }

    write_response(writer, "200 OK", METRICS_CONTENT_TYPE, &[], &body)
}

/// Read the request line and skip the headers. `None` if the peer sent nothing.
fn read_head<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut request_line = String::new();
    if read_bounded_line(reader, &mut request_line)? == 0 {
        return Ok(None);
    }

    let mut line = String::new();
    for _ in 0..MAX_HEADER_LINES {
        line.clear();
        let n = read_bounded_line(reader, &mut line)?;
        if n == 0 || line.trim_end().is_empty() {
            break;
        }
    }
    Ok(Some(request_line))
}

fn read_bounded_line<R: BufRead>(reader: &mut R, line: &mut String) -> io::Result<usize> {
    let n = reader.by_ref().take(MAX_LINE_BYTES).read_line(line)?;
    if n as u64 == MAX_LINE_BYTES && !line.ends_with('\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {MAX_LINE_BYTES} bytes"),
        ));
    }
    Ok(n)
}

fn write_response<W: Write>(
    writer: &mut W,
    status: &str,
    content_type: &str,
    extra_headers: &[(&str, &str)],
    body: &[u8],
) -> io::Result<()> {
    write!(writer, "HTTP/1.1 {status}\r\n")?;
    write!(writer, "Content-Type: {content_type}\r\n")?;
    write!(writer, "Content-Length: {}\r\n", body.len())?;
    for (name, value) in extra_headers {
        write!(writer, "{name}: {value}\r\n")?;
    }
    write!(writer, "Connection: close\r\n\r\n")?;
    writer.write_all(body)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use vcio_property::tags;
    use vcio_transport::{FakeFirmware, FakeResponse};

    use super::*;

    fn respond(request: &str) -> (String, Mailbox<FakeFirmware>) {
        let mut mbox = Mailbox::new(FakeFirmware::new(|tag, region| match tag {
            tags::GET_FIRMWARE_REVISION => FakeResponse::Value(vec![7]),
            _ => FakeResponse::Value(vec![region[0], 1]),
        }));
        let mut out = Vec::new();
        handle_request(Cursor::new(request.as_bytes()), &mut out, &mut mbox)
            .expect("handling should succeed");
        (String::from_utf8(out).expect("response is utf-8"), mbox)
    }

    #[test]
    fn metrics_path_returns_exposition() {
        let (response, mbox) =
            respond("GET /metrics HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n");

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/plain; version=0.0.4; charset=utf-8\r\n"));
        assert!(response.contains("\r\n\r\n# HELP rpi_vc_revision"));
        assert!(response.contains("rpi_vc_revision 7\n"));
        assert!(!mbox.transport().requests().is_empty());
    }

    #[test]
    fn content_length_matches_body() {
        let (response, _) = respond("GET /metrics?name=x HTTP/1.0\r\n\r\n");
        let (head, body) = response
            .split_once("\r\n\r\n")
            .expect("response has a header block");
        let expected = format!("Content-Length: {}\r\n", body.len());
        assert!(head.contains(expected.trim_end()));
    }

    #[test]
    fn other_paths_are_not_found_without_touching_the_device() {
        let (response, mbox) = respond("GET / HTTP/1.1\r\n\r\n");

        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(mbox.transport().requests().is_empty());
    }

    #[test]
    fn non_get_methods_are_rejected() {
        let (response, mbox) = respond("POST /metrics HTTP/1.1\r\nContent-Length: 0\r\n\r\n");

        assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(response.contains("Allow: GET\r\n"));
        assert!(mbox.transport().requests().is_empty());
    }

    #[test]
    fn overlong_request_line_is_rejected() {
        let request = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(10_000));
        let (response, mbox) = respond(&request);

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(mbox.transport().requests().is_empty());
    }

    #[test]
    fn overlong_header_is_rejected() {
        let request = format!(
            "GET /metrics HTTP/1.1\r\nCookie: {}\r\n\r\n",
            "c".repeat(10_000)
        );
        let (response, mbox) = respond(&request);

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(mbox.transport().requests().is_empty());
    }

    #[test]
    fn line_at_the_limit_is_accepted() {
        let mut reader = Cursor::new(format!("{}\n", "x".repeat(MAX_LINE_BYTES as usize - 1)));
        let mut line = String::new();
        let n = read_bounded_line(&mut reader, &mut line).expect("line fits");
        assert_eq!(n as u64, MAX_LINE_BYTES);
    }

    #[test]
    fn empty_connection_writes_nothing() {
        let (response, _) = respond("");
        assert!(response.is_empty());
    }
}
