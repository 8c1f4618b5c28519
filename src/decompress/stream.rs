use crate::{
    decompress::{
        bitreader::BitReader,
        buffer::{AdaptiveBuffer, GrowthHint},
        read_block_header, read_dynamic_tables, read_length_distance, read_stored_header,
        BlockType, DecompressionError,
    },
    huffman::HuffmanTable,
};

/// Longest run of bytes a single symbol can produce.
const MAX_MATCH: usize = 258;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initialized,
    BlockHeaderStart,
    BlockHeaderEnd,
    BlockBodyStart,
    BlockBodyEnd,
    DecodeBlockStart,
    DecodeBlockEnd,
    Done,
}

/// Result of one step of the state machine.
enum Flow {
    Advanced,
    NeedInput,
}

/// Separate running out of input, which yields `Ok(None)`, from errors in the data.
fn suspend_on_short_input<T>(
    result: Result<T, DecompressionError>,
) -> Result<Option<T>, DecompressionError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DecompressionError::InsufficientInput) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Incremental raw deflate decoder.
///
/// Input can be supplied in arbitrary pieces. Each call to [`decompress`](Self::decompress)
/// decodes as far as the input allows and returns the output produced since the previous call.
/// A parse step that runs out of input is rolled back to the checkpoint taken just before it, and
/// retried when more input arrives.
///
/// All output is retained, and [`get_bytes`](Self::get_bytes) returns everything decoded so far.
///
/// ```
/// use rawflate::{compress_to_vec, StreamDecompressor};
///
/// let compressed = compress_to_vec(b"streaming streaming streaming");
/// let mut decompressor = StreamDecompressor::default();
/// let mut output = Vec::new();
/// for chunk in compressed.chunks(3) {
///     output.extend(decompressor.decompress(Some(chunk)).unwrap());
/// }
/// assert!(decompressor.is_done());
/// assert_eq!(output, b"streaming streaming streaming");
/// ```
pub struct StreamDecompressor {
    /// Input that has not been fully consumed yet.
    input: Vec<u8>,
    reader: BitReader,
    checkpoint: BitReader,

    output: AdaptiveBuffer,
    /// Start of the output not yet returned from `decompress`.
    sp: usize,

    state: State,
    bfinal: bool,
    block_type: BlockType,
    /// Bytes left to copy from the current stored block.
    block_length: usize,
    /// Code tables of the current block, `None` for stored blocks.
    tables: Option<(HuffmanTable, HuffmanTable)>,

    error: Option<DecompressionError>,
}

impl StreamDecompressor {
    /// Create a decoder whose stream starts at `input[index..]`. `buffer_size` is the initial size
    /// of the output buffer.
    pub fn new(input: &[u8], index: usize, buffer_size: usize) -> Self {
        Self {
            input: input.get(index..).unwrap_or_default().to_vec(),
            reader: BitReader::new(0),
            checkpoint: BitReader::new(0),
            output: AdaptiveBuffer::new(buffer_size),
            sp: 0,
            state: State::Initialized,
            bfinal: false,
            block_type: BlockType::Stored,
            block_length: 0,
            tables: None,
            error: None,
        }
    }

    /// Append `more_input` to the buffered input, decode as far as possible, and return the
    /// output produced since the previous call.
    ///
    /// Running out of input is not an error; the call just returns what it could decode. Once an
    /// error has been returned, every later call returns the same error.
    pub fn decompress(
        &mut self,
        more_input: Option<&[u8]>,
    ) -> Result<Vec<u8>, DecompressionError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let Some(bytes) = more_input {
            self.input.extend_from_slice(bytes);
        }

        if let Err(err) = self.run() {
            self.error = Some(err);
            return Err(err);
        }

        // Drop consumed input. Bits of a partially consumed byte stay in the reader.
        self.reader.rewind_whole_bytes();
        self.input.drain(..self.reader.ip);
        self.reader.ip = 0;

        let output = self.output.as_slice()[self.sp..].to_vec();
        self.sp = self.output.len();
        Ok(output)
    }

    /// All output decoded so far, including output already returned by `decompress`.
    pub fn get_bytes(&self) -> &[u8] {
        self.output.as_slice()
    }

    /// Whether the end of the final block has been reached.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Input received but not consumed yet. Once the stream is done, this is whatever followed
    /// it.
    pub fn pending_input(&self) -> &[u8] {
        &self.input[self.reader.ip..]
    }

    fn run(&mut self) -> Result<(), DecompressionError> {
        loop {
            let flow = match self.state {
                State::Initialized => {
                    self.state = State::BlockHeaderStart;
                    Flow::Advanced
                }
                State::BlockHeaderStart => self.parse_block_header()?,
                State::BlockHeaderEnd => {
                    self.state = State::BlockBodyStart;
                    Flow::Advanced
                }
                State::BlockBodyStart => self.parse_block_body()?,
                State::BlockBodyEnd => {
                    self.state = State::DecodeBlockStart;
                    Flow::Advanced
                }
                State::DecodeBlockStart => match self.tables.take() {
                    None => self.decode_stored(),
                    Some(tables) => {
                        let flow = self.decode_huffman(&tables)?;
                        self.tables = Some(tables);
                        flow
                    }
                },
                State::DecodeBlockEnd => {
                    self.tables = None;
                    self.state = if self.bfinal {
                        log::debug!("finished deflate stream, {} bytes", self.output.len());
                        State::Done
                    } else {
                        State::BlockHeaderStart
                    };
                    Flow::Advanced
                }
                State::Done => return Ok(()),
            };

            if let Flow::NeedInput = flow {
                return Ok(());
            }
        }
    }

    fn save(&mut self) {
        self.checkpoint = self.reader;
    }

    fn restore(&mut self) {
        self.reader = self.checkpoint;
    }

    fn parse_block_header(&mut self) -> Result<Flow, DecompressionError> {
        self.save();
        let result = read_block_header(&mut self.reader, &self.input);
        match suspend_on_short_input(result)? {
            Some((bfinal, block_type)) => {
                self.bfinal = bfinal;
                self.block_type = block_type;
                self.state = State::BlockHeaderEnd;
                Ok(Flow::Advanced)
            }
            None => {
                self.restore();
                Ok(Flow::NeedInput)
            }
        }
    }

    fn parse_block_body(&mut self) -> Result<Flow, DecompressionError> {
        self.save();
        match self.block_type {
            BlockType::Stored => {
                let result = read_stored_header(&mut self.reader, &self.input);
                match suspend_on_short_input(result)? {
                    Some(len) => {
                        self.block_length = len;
                        self.tables = None;
                    }
                    None => {
                        self.restore();
                        return Ok(Flow::NeedInput);
                    }
                }
            }
            BlockType::Fixed => {
                self.tables = Some((HuffmanTable::fixed_litlen(), HuffmanTable::fixed_dist()));
            }
            BlockType::Dynamic => {
                let result = read_dynamic_tables(&mut self.reader, &self.input);
                match suspend_on_short_input(result)? {
                    Some(tables) => self.tables = Some(tables),
                    None => {
                        self.restore();
                        return Ok(Flow::NeedInput);
                    }
                }
            }
        }
        self.state = State::BlockBodyEnd;
        Ok(Flow::Advanced)
    }

    /// Copy as much of the stored block as has arrived.
    fn decode_stored(&mut self) -> Flow {
        let bytes = self.reader.take_bytes(&self.input, self.block_length);
        let hint = GrowthHint {
            input_len: self.input.len(),
            ip: self.reader.ip,
            min_code_length: 0,
            fix_ratio: Some(2),
        };
        self.output.extend_from_slice(bytes, hint);
        self.block_length -= bytes.len();

        if self.block_length > 0 {
            return Flow::NeedInput;
        }
        self.state = State::DecodeBlockEnd;
        Flow::Advanced
    }

    /// Decode symbols until the end of the block, checkpointing before each one.
    fn decode_huffman(
        &mut self,
        (litlen_table, dist_table): &(HuffmanTable, HuffmanTable),
    ) -> Result<Flow, DecompressionError> {
        let min_code_length = litlen_table.min_code_length();

        loop {
            self.checkpoint = self.reader;
            self.output.reserve(
                MAX_MATCH,
                GrowthHint {
                    input_len: self.input.len(),
                    ip: self.reader.ip,
                    min_code_length,
                    fix_ratio: None,
                },
            );

            let result = self.reader.read_code(
                &self.input,
                litlen_table,
                DecompressionError::InvalidLiteralLengthCode,
            );
            let symbol = match suspend_on_short_input(result)? {
                Some(symbol) => symbol,
                None => {
                    self.reader = self.checkpoint;
                    return Ok(Flow::NeedInput);
                }
            };

            match symbol {
                0..=255 => self.output.push(symbol as u8),
                256 => {
                    self.state = State::DecodeBlockEnd;
                    return Ok(Flow::Advanced);
                }
                _ => {
                    let result =
                        read_length_distance(&mut self.reader, &self.input, symbol, dist_table);
                    match suspend_on_short_input(result)? {
                        Some((length, distance)) => self.output.copy_match(length, distance)?,
                        None => {
                            self.reader = self.checkpoint;
                            return Ok(Flow::NeedInput);
                        }
                    }
                }
            }
        }
    }
}

impl Default for StreamDecompressor {
    fn default() -> Self {
        Self::new(&[], 0, 0x8000)
    }
}
