#![no_main]
use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use ws_stream_codec::{FrameDecoder, Result};

fn run(data: &[u8]) -> Result<()> {
    let (chunk, data) = match data.split_first() {
        Some((&chunk, data)) => (chunk as usize + 1, data),
        None => return Ok(()),
    };

    let mut stream = Cursor::new(data);
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0; chunk];
    loop {
        let info = decoder.decode(&mut stream, &mut buf)?;
        assert!(info.bytes_delivered <= chunk);
    }
}

fuzz_target!(|data: &[u8]| {
    let _ = run(data);
});
