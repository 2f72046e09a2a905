use crate::error;
use crate::lang::{io_error, Error};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Error>;

const END_OF_FILE: u8 = 0x1A;

/// ## Open file table
///
/// Files opened by the program, by file number. A table entry can also be a
/// stale handle left behind by a resume that could not reopen its file; it
/// answers every access with the reopen error until it is closed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileMode {
    Input,
    Output,
    Append,
    Random,
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use FileMode::*;
        match self {
            Input => write!(f, "INPUT"),
            Output => write!(f, "OUTPUT"),
            Append => write!(f, "APPEND"),
            Random => write!(f, "RANDOM"),
        }
    }
}

/// What a snapshot remembers about one open file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub number: u8,
    pub path: PathBuf,
    pub mode: FileMode,
    pub record_len: u16,
    pub position: u64,
}

#[derive(Debug)]
enum Handle {
    Open(OpenFile),
    Stale(FileRecord, Error),
}

#[derive(Debug)]
struct OpenFile {
    path: PathBuf,
    mode: FileMode,
    record_len: u16,
    file: File,
}

#[derive(Debug)]
pub struct FileTable {
    max_files: u8,
    record_len: u16,
    handles: BTreeMap<u8, Handle>,
}

impl FileTable {
    /// A table for file numbers `1..=max_files`. RANDOM files opened without
    /// a record length get `record_len`.
    pub fn new(max_files: u8, record_len: u16) -> FileTable {
        FileTable {
            max_files,
            record_len,
            handles: BTreeMap::new(),
        }
    }

    pub fn max_files(&self) -> u8 {
        self.max_files
    }

    pub fn is_open(&self, number: u8) -> bool {
        self.handles.contains_key(&number)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn mode(&self, number: u8) -> Result<FileMode> {
        match self.handles.get(&number) {
            Some(Handle::Open(open)) => Ok(open.mode),
            Some(Handle::Stale(_, error)) => Err(error.clone()),
            None => Err(error!(BadFileNumber, #number)),
        }
    }

    pub fn open<P: AsRef<Path>>(
        &mut self,
        number: u8,
        path: P,
        mode: FileMode,
        record_len: Option<u16>,
    ) -> Result<()> {
        self.check_number(number)?;
        if self.handles.contains_key(&number) {
            return Err(error!(FileAlreadyOpen, #number));
        }
        let record_len = record_len.unwrap_or(self.record_len);
        if mode == FileMode::Random && record_len == 0 {
            return Err(error!(IllegalFunctionCall, #number));
        }
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        match mode {
            FileMode::Input => options.read(true),
            FileMode::Output => options.write(true).create(true).truncate(true),
            FileMode::Append => options.append(true).create(true),
            FileMode::Random => options.read(true).write(true).create(true),
        };
        let mut file = options
            .open(path)
            .map_err(|e| io_error(&e).in_handle(number))?;
        if mode == FileMode::Append {
            file.seek(SeekFrom::End(0))
                .map_err(|e| io_error(&e).in_handle(number))?;
        }
        debug!("opened #{} {} for {}", number, path.display(), mode);
        self.handles.insert(
            number,
            Handle::Open(OpenFile {
                path: path.to_path_buf(),
                mode,
                record_len,
                file,
            }),
        );
        Ok(())
    }

    pub fn write(&mut self, number: u8, bytes: &[u8]) -> Result<()> {
        let open = self.open_file(number)?;
        if open.mode == FileMode::Input {
            return Err(error!(BadFileMode, #number));
        }
        open.file
            .write_all(bytes)
            .map_err(|e| io_error(&e).in_handle(number))
    }

    /// Read exactly `count` bytes.
    pub fn read(&mut self, number: u8, count: usize) -> Result<Vec<u8>> {
        let open = self.open_file(number)?;
        if open.mode != FileMode::Input && open.mode != FileMode::Random {
            return Err(error!(BadFileMode, #number));
        }
        let mut buf = vec![0; count];
        match open.file.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(error!(InputPastEnd, #number))
            }
            Err(e) => Err(io_error(&e).in_handle(number)),
        }
    }

    /// Read one line of an INPUT file without its terminator.
    pub fn read_line(&mut self, number: u8) -> Result<String> {
        let open = self.open_file(number)?;
        if open.mode != FileMode::Input {
            return Err(error!(BadFileMode, #number));
        }
        if open.next_byte(number)?.is_none() {
            return Err(error!(InputPastEnd, #number));
        }
        open.back(number)?;
        let mut line = vec![];
        loop {
            match open.next_byte(number)? {
                None => break,
                Some(b'\n') => break,
                Some(b'\r') => {
                    if let Some(c) = open.next_byte(number)? {
                        if c != b'\n' {
                            open.back(number)?;
                        }
                    }
                    break;
                }
                Some(c) => line.push(c),
            }
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn eof(&mut self, number: u8) -> Result<bool> {
        let open = self.open_file(number)?;
        match open.mode {
            FileMode::Input => match open.next_byte(number)? {
                None => Ok(true),
                Some(_) => {
                    open.back(number)?;
                    Ok(false)
                }
            },
            FileMode::Random => {
                let len = open
                    .file
                    .metadata()
                    .map_err(|e| io_error(&e).in_handle(number))?
                    .len();
                Ok(open.position(number)? >= len)
            }
            FileMode::Output | FileMode::Append => Err(error!(BadFileMode, #number)),
        }
    }

    pub fn position(&self, number: u8) -> Result<u64> {
        match self.handles.get(&number) {
            Some(Handle::Open(open)) => open.position(number),
            Some(Handle::Stale(_, error)) => Err(error.clone()),
            None => Err(error!(BadFileNumber, #number)),
        }
    }

    pub fn close(&mut self, number: u8) -> Result<()> {
        match self.handles.remove(&number) {
            Some(Handle::Open(mut open)) => {
                if open.mode == FileMode::Output || open.mode == FileMode::Append {
                    open.file
                        .write_all(&[END_OF_FILE])
                        .map_err(|e| io_error(&e).in_handle(number))?;
                }
                debug!("closed #{} {}", number, open.path.display());
                Ok(())
            }
            Some(Handle::Stale(..)) | None => Ok(()),
        }
    }

    /// Close everything, reporting the first failure.
    pub fn close_all(&mut self) -> Result<()> {
        let numbers: Vec<u8> = self.handles.keys().copied().collect();
        let mut result = Ok(());
        for number in numbers {
            if let Err(error) = self.close(number) {
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }

    /// Current state of every handle, positions included.
    pub fn records(&self) -> Result<Vec<FileRecord>> {
        let mut records = vec![];
        for (&number, handle) in self.handles.iter() {
            records.push(match handle {
                Handle::Open(open) => FileRecord {
                    number,
                    path: open.path.clone(),
                    mode: open.mode,
                    record_len: open.record_len,
                    position: open.position(number)?,
                },
                Handle::Stale(record, _) => record.clone(),
            });
        }
        Ok(records)
    }

    /// Put a file back where a snapshot found it. On failure the handle is
    /// kept as stale and the error is returned as well.
    pub fn reopen(&mut self, record: &FileRecord) -> Result<()> {
        let number = record.number;
        if self.handles.contains_key(&number) {
            return Err(error!(FileAlreadyOpen, #number));
        }
        let reopened = match self.check_number(number) {
            Ok(()) => reopen_file(record).map_err(|e| e.to_string()),
            Err(e) => Err(e.code().to_string()),
        };
        match reopened {
            Ok(file) => {
                debug!(
                    "reopened #{} {} at {}",
                    number,
                    record.path.display(),
                    record.position
                );
                self.handles.insert(
                    number,
                    Handle::Open(OpenFile {
                        path: record.path.clone(),
                        mode: record.mode,
                        record_len: record.record_len,
                        file,
                    }),
                );
                Ok(())
            }
            Err(reason) => {
                let error = error!(FileReopenFailed, #number;
                    format!("{}: {}", record.path.display(), reason));
                warn!("could not reopen file: {}", error);
                self.handles
                    .insert(number, Handle::Stale(record.clone(), error.clone()));
                Err(error)
            }
        }
    }

    fn check_number(&self, number: u8) -> Result<()> {
        if number == 0 || number > self.max_files {
            Err(error!(BadFileNumber, #number))
        } else {
            Ok(())
        }
    }

    fn open_file(&mut self, number: u8) -> Result<&mut OpenFile> {
        match self.handles.get_mut(&number) {
            Some(Handle::Open(open)) => Ok(open),
            Some(Handle::Stale(_, error)) => Err(error.clone()),
            None => Err(error!(BadFileNumber, #number)),
        }
    }
}

impl Drop for FileTable {
    fn drop(&mut self) {
        if let Err(error) = self.close_all() {
            warn!("closing files: {}", error);
        }
    }
}

impl OpenFile {
    fn position(&self, number: u8) -> Result<u64> {
        (&self.file)
            .seek(SeekFrom::Current(0))
            .map_err(|e| io_error(&e).in_handle(number))
    }

    /// Next byte of an INPUT file; the end of file byte reads as the end.
    fn next_byte(&mut self, number: u8) -> Result<Option<u8>> {
        let mut buf = [0; 1];
        match self.file.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) if buf[0] == END_OF_FILE => {
                self.back(number)?;
                Ok(None)
            }
            Ok(_) => Ok(Some(buf[0])),
            Err(e) => Err(io_error(&e).in_handle(number)),
        }
    }

    fn back(&mut self, number: u8) -> Result<()> {
        self.file
            .seek(SeekFrom::Current(-1))
            .map(|_| ())
            .map_err(|e| io_error(&e).in_handle(number))
    }
}

fn reopen_file(record: &FileRecord) -> std::io::Result<File> {
    match record.mode {
        FileMode::Input => {
            let mut file = File::open(&record.path)?;
            file.seek(SeekFrom::Start(record.position))?;
            Ok(file)
        }
        FileMode::Output => {
            let mut file = OpenOptions::new().write(true).open(&record.path)?;
            file.set_len(record.position)?;
            file.seek(SeekFrom::Start(record.position))?;
            Ok(file)
        }
        FileMode::Append => {
            let mut file = OpenOptions::new().append(true).open(&record.path)?;
            file.set_len(record.position)?;
            file.seek(SeekFrom::End(0))?;
            Ok(file)
        }
        FileMode::Random => {
            if record.record_len == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "zero record length",
                ));
            }
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&record.path)?;
            file.seek(SeekFrom::Start(record.position))?;
            Ok(file)
        }
    }
}
