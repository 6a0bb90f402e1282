use std::io::{self, BufRead, Write};

use structopt::StructOpt;
use ws_stream::{ClientBuilder, Opcode, Result};

#[derive(Debug, StructOpt)]
#[structopt(name = "wsdump", about = "WebSocket Simple Dump Tool")]
struct Opt {
    /// size of the buffer handed to each receive call
    #[structopt(long = "chunk", default_value = "4096")]
    chunk: usize,

    /// check the server's Sec-WebSocket-Accept header
    #[structopt(long = "verify-accept")]
    verify_accept: bool,

    /// websocket url. ex. ws://echo.websocket.org/
    ws_url: String,
}

fn main() -> Result<()> {
    let Opt {
        chunk,
        verify_accept,
        ws_url,
    } = Opt::from_args();

    let mut client = ClientBuilder::new(&ws_url)?.verify_accept(verify_accept).connect()?;
    let mut buf = vec![0; chunk.max(1)];
    let mut ping = Vec::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        client.send(line?.as_bytes())?;

        // Print frames until one text or binary message has been completely received.
        loop {
            let info = client.receive(&mut buf)?;
            let data = &buf[..info.bytes_delivered];
            match info.opcode {
                Opcode::Text | Opcode::Binary => {
                    let stdout = io::stdout();
                    let mut stdout = stdout.lock();
                    stdout.write_all(data)?;
                    if info.fin {
                        stdout.write_all(b"\n")?;
                    }

                    stdout.flush()?;
                }
                Opcode::Ping => {
                    ping.extend_from_slice(data);
                    if info.fin {
                        client.send_frame(Opcode::Pong, &ping)?;
                        ping.clear();
                    }
                }
                Opcode::Close => return Ok(()),
                Opcode::Pong | Opcode::Continuation => {}
            }

            if info.fin && info.opcode.is_data() {
                break;
            }
        }
    }

    client.close()
}
