// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::core::util::DocId;

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    errors {
        FormatMismatch(desc: String) {
            description(desc)
            display("Format mismatch: {}", desc)
        }

        CorruptIndex(errmsg: String) {
            description(errmsg)
            display("Corrupt Index: {}", errmsg)
        }

        EndOfData(doc_id: DocId) {
            description("no more documents")
            display("End of data: no chunk holds doc {}", doc_id)
        }

        UnexpectedEOF(errmsg: String) {
            description(errmsg)
            display("Unexpected EOF: {}", errmsg)
        }

        IllegalState(desc: String) {
            description(desc)
            display("Illegal state: {}", desc)
        }

        IllegalArgument(desc: String) {
            description(desc)
            display("Illegal argument: {}", desc)
        }
    }

    foreign_links {
        IoError(::std::io::Error);
        FromUtf8Err(::std::string::FromUtf8Error);
    }
}

impl Error {
    /// Whether this error only signals that every stored document has been
    /// visited.
    pub fn is_end_of_data(&self) -> bool {
        match self.kind() {
            ErrorKind::EndOfData(_) => true,
            _ => false,
        }
    }

    pub fn is_unexpected_eof(&self) -> bool {
        match self.kind() {
            ErrorKind::UnexpectedEOF(_) => true,
            _ => false,
        }
    }
}
