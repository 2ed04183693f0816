//! Just enough HTTP to serve the status page.
//!
//! Requests are never routed: any request gets the page once its headers
//! end. Bytes arrive in whatever chunks the transport delivers.

use heapless::String;
use ufmt::uWrite;

use crate::clock::DateTime;
use crate::rendering::write_status_page;
use crate::sensors::ReadingPair;

const REQUEST_LINE_CAPACITY: usize = 64;

/// Incremental request reader. Finished on the first empty line.
pub struct RequestReader {
    line_len: usize,
    lines: usize,
    request_line: String<REQUEST_LINE_CAPACITY>,
    complete: bool,
}

impl RequestReader {
    pub const fn new() -> RequestReader {
        Self {
            line_len: 0,
            lines: 0,
            request_line: String::new(),
            complete: false,
        }
    }

    /// Consumes `bytes` and returns true once the header block has ended.
    /// Bytes after the blank line are ignored.
    pub fn feed(&mut self, bytes: &[u8]) -> bool {
        for &byte in bytes {
            if self.complete {
                break;
            }
            match byte {
                b'\n' => {
                    if self.line_len == 0 {
                        debug!("request complete after {=usize} lines", self.lines);
                        self.complete = true;
                    } else {
                        self.lines += 1;
                        self.line_len = 0;
                    }
                }
                b'\r' => {}
                _ => {
                    if self.lines == 0 && byte.is_ascii() {
                        // Long request lines are truncated, they are only logged.
                        let _ = self.request_line.push(byte as char);
                    }
                    self.line_len += 1;
                }
            }
        }
        self.complete
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// First line of the request, e.g. `GET / HTTP/1.1`. May be truncated.
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the full response: status line, headers, page, trailing blank
/// line.
pub fn write_response<W: uWrite + ?Sized>(
    w: &mut W,
    readings: &ReadingPair,
    threshold: f32,
    time: &DateTime,
    refresh_secs: u16,
) -> Result<(), W::Error> {
    w.write_str("HTTP/1.1 200 OK\r\n")?;
    w.write_str("Content-type:text/html\r\n")?;
    w.write_str("Connection: close\r\n")?;
    w.write_str("\r\n")?;
    write_status_page(w, readings, threshold, time, refresh_secs)?;
    w.write_str("\r\n")
}
