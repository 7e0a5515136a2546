#![no_main]

use libfuzzer_sys::fuzz_target;
use plyx::{NullTarget, read::Reader};

fuzz_target!(|data: &[u8]| {
    // Only panics (or worse) are interesting here: it's perfectly fine for
    // the reader to reject the input. Declared counts can be huge, so we
    // don't collect anything.
    let _ = Reader::new(data).and_then(|r| r.read_content(&mut NullTarget));
});
