//! Index data handed over in user memory instead of a GPU buffer.
//!
//! The index fetcher only reads 16- and 32-bit elements, so 8-bit indices are
//! widened to 16 bits while they are copied into an upload buffer.

use sidraw_pm4::IndexType;

use super::IndexBuffer;
use crate::error::DrawError;
use crate::winsys::{Buffer, UploadAllocator};

/// Indices living in application memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserIndices<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl UserIndices<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type after upload. 8-bit indices come out as 16-bit.
    pub fn uploaded_type(&self) -> IndexType {
        match self {
            Self::U8(_) | Self::U16(_) => IndexType::Uint16,
            Self::U32(_) => IndexType::Uint32,
        }
    }
}

/// Pack 16-bit indices into upload words, keeping their in-memory order.
fn pack_u16(indices: impl ExactSizeIterator<Item = u16>) -> Vec<u32> {
    let mut words = Vec::with_capacity(indices.len().div_ceil(2));
    let mut pending: Option<u16> = None;
    for index in indices {
        match pending.take() {
            None => pending = Some(index),
            Some(first) => words.push(join(first, index)),
        }
    }
    if let Some(last) = pending {
        words.push(join(last, 0));
    }
    words
}

fn join(first: u16, second: u16) -> u32 {
    let [a, b] = first.to_ne_bytes();
    let [c, d] = second.to_ne_bytes();
    u32::from_ne_bytes([a, b, c, d])
}

/// Dwords to upload for `indices`, 8-bit elements widened to 16 bits.
pub fn translate_user_indices(indices: UserIndices<'_>) -> Vec<u32> {
    match indices {
        UserIndices::U8(v) => pack_u16(v.iter().map(|&i| u16::from(i))),
        UserIndices::U16(v) => pack_u16(v.iter().copied()),
        UserIndices::U32(v) => v.to_vec(),
    }
}

/// Copy `indices` into a fresh upload buffer and describe it as an index buffer.
///
/// The buffer size recorded is the size of the indices themselves, not of the
/// padded upload, so the draw's index bound stays exact.
pub fn upload_user_indices<W>(
    winsys: &mut W,
    indices: UserIndices<'_>,
) -> Result<IndexBuffer, DrawError>
where
    W: UploadAllocator + ?Sized,
{
    let index_type = indices.uploaded_type();
    let words = translate_user_indices(indices);
    let Some(upload) = winsys.upload(&words) else {
        tracing::warn!(
            indices = indices.len(),
            dwords = words.len(),
            "index upload failed"
        );
        return Err(DrawError::UploadExhausted);
    };
    let size = indices.len() as u64 * u64::from(index_type.size_bytes());
    Ok(IndexBuffer {
        buffer: Buffer {
            handle: upload.handle,
            size,
        },
        index_type,
        offset: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::winsys::BufferHandle;
    use pretty_assertions::assert_eq;

    struct Uploads {
        next: u32,
        data: Vec<Vec<u32>>,
        refuse: bool,
    }

    impl UploadAllocator for Uploads {
        fn upload(&mut self, data: &[u32]) -> Option<Buffer> {
            if self.refuse {
                return None;
            }
            self.next += 1;
            self.data.push(data.to_vec());
            Some(Buffer {
                handle: BufferHandle(self.next),
                size: (data.len() * 4) as u64,
            })
        }
    }

    fn uploads() -> Uploads {
        Uploads {
            next: 0,
            data: Vec::new(),
            refuse: false,
        }
    }

    fn halves(words: &[u32]) -> Vec<u16> {
        words
            .iter()
            .flat_map(|w| {
                let [a, b, c, d] = w.to_ne_bytes();
                [u16::from_ne_bytes([a, b]), u16::from_ne_bytes([c, d])]
            })
            .collect()
    }

    #[test]
    fn byte_indices_are_widened_in_order() {
        let words = translate_user_indices(UserIndices::U8(&[0, 1, 2, 255, 7]));
        assert_eq!(words.len(), 3);
        assert_eq!(halves(&words), vec![0, 1, 2, 255, 7, 0]);
    }

    #[test]
    fn short_indices_keep_memory_layout() {
        let words = translate_user_indices(UserIndices::U16(&[3, 4, 5, 6]));
        assert_eq!(halves(&words), vec![3, 4, 5, 6]);
    }

    #[test]
    fn upload_records_unpadded_size() {
        let mut up = uploads();
        let ib = upload_user_indices(&mut up, UserIndices::U8(&[0, 1, 2])).unwrap();
        assert_eq!(ib.index_type, IndexType::Uint16);
        assert_eq!(ib.buffer.size, 6);
        assert_eq!(ib.buffer.handle, BufferHandle(1));
        assert_eq!(up.data[0].len(), 2);

        let ib = upload_user_indices(&mut up, UserIndices::U32(&[9, 8, 7])).unwrap();
        assert_eq!(ib.index_type, IndexType::Uint32);
        assert_eq!(ib.buffer.size, 12);
        assert_eq!(up.data[1], vec![9, 8, 7]);
    }

    #[test]
    fn exhausted_upload_is_reported() {
        let mut up = uploads();
        up.refuse = true;
        assert!(matches!(
            upload_user_indices(&mut up, UserIndices::U16(&[1, 2])),
            Err(DrawError::UploadExhausted)
        ));
    }
}
