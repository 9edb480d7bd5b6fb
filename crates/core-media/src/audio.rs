use core_model::{RuntimeError, RuntimeResult};

/// PCM sample formats the buffer can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    U8,
    S8,
    S16,
    S32,
    S64,
    Float,
    Double,
}

impl SampleFormat {
    pub fn byte_count(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::S8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::Float => 4,
            SampleFormat::S64 | SampleFormat::Double => 8,
        }
    }
}

/// Stream parameters; two buffers are compatible only when these match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u8,
    pub format: SampleFormat,
}

/// Tagged storage over the seven supported formats.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    U8(Vec<u8>),
    S8(Vec<i8>),
    S16(Vec<i16>),
    S32(Vec<i32>),
    S64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl SampleBuffer {
    pub fn empty(format: SampleFormat) -> Self {
        match format {
            SampleFormat::U8 => SampleBuffer::U8(Vec::new()),
            SampleFormat::S8 => SampleBuffer::S8(Vec::new()),
            SampleFormat::S16 => SampleBuffer::S16(Vec::new()),
            SampleFormat::S32 => SampleBuffer::S32(Vec::new()),
            SampleFormat::S64 => SampleBuffer::S64(Vec::new()),
            SampleFormat::Float => SampleBuffer::Float(Vec::new()),
            SampleFormat::Double => SampleBuffer::Double(Vec::new()),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBuffer::U8(_) => SampleFormat::U8,
            SampleBuffer::S8(_) => SampleFormat::S8,
            SampleBuffer::S16(_) => SampleFormat::S16,
            SampleBuffer::S32(_) => SampleFormat::S32,
            SampleBuffer::S64(_) => SampleFormat::S64,
            SampleBuffer::Float(_) => SampleFormat::Float,
            SampleBuffer::Double(_) => SampleFormat::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::U8(v) => v.len(),
            SampleBuffer::S8(v) => v.len(),
            SampleBuffer::S16(v) => v.len(),
            SampleBuffer::S32(v) => v.len(),
            SampleBuffer::S64(v) => v.len(),
            SampleBuffer::Float(v) => v.len(),
            SampleBuffer::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slice_indices(&self, indices: &[usize]) -> SampleBuffer {
        fn pick<T: Copy>(v: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| v[i]).collect()
        }
        match self {
            SampleBuffer::U8(v) => SampleBuffer::U8(pick(v, indices)),
            SampleBuffer::S8(v) => SampleBuffer::S8(pick(v, indices)),
            SampleBuffer::S16(v) => SampleBuffer::S16(pick(v, indices)),
            SampleBuffer::S32(v) => SampleBuffer::S32(pick(v, indices)),
            SampleBuffer::S64(v) => SampleBuffer::S64(pick(v, indices)),
            SampleBuffer::Float(v) => SampleBuffer::Float(pick(v, indices)),
            SampleBuffer::Double(v) => SampleBuffer::Double(pick(v, indices)),
        }
    }

    fn extend_from(&mut self, other: &SampleBuffer) -> RuntimeResult<()> {
        match (self, other) {
            (SampleBuffer::U8(a), SampleBuffer::U8(b)) => a.extend_from_slice(b),
            (SampleBuffer::S8(a), SampleBuffer::S8(b)) => a.extend_from_slice(b),
            (SampleBuffer::S16(a), SampleBuffer::S16(b)) => a.extend_from_slice(b),
            (SampleBuffer::S32(a), SampleBuffer::S32(b)) => a.extend_from_slice(b),
            (SampleBuffer::S64(a), SampleBuffer::S64(b)) => a.extend_from_slice(b),
            (SampleBuffer::Float(a), SampleBuffer::Float(b)) => a.extend_from_slice(b),
            (SampleBuffer::Double(a), SampleBuffer::Double(b)) => a.extend_from_slice(b),
            _ => {
                return Err(RuntimeError::BadFormat(
                    "sample buffers disagree on sample format".into(),
                ))
            }
        }
        Ok(())
    }
}

/// A decoded audio clip: spec plus samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    pub spec: AudioSpec,
    pub data: SampleBuffer,
}

impl AudioData {
    pub fn empty(spec: AudioSpec) -> Self {
        Self {
            spec,
            data: SampleBuffer::empty(spec.format),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    pub fn byte_length(&self) -> usize {
        self.sample_count() * self.spec.format.byte_count()
    }

    /// Python-style slice over samples.
    ///
    /// Negative `from`/`to` are relative to the length; `to = None` means
    /// the whole remaining extent in the step direction; `step = 0` means
    /// +1 when `from < to`, −1 otherwise. The `to` bound is exclusive.
    pub fn slice(&self, from: i64, to: Option<i64>, step: i64) -> RuntimeResult<AudioData> {
        let len = self.sample_count() as i64;

        let mut from = if from < 0 { len + from } else { from };
        let mut to = match to {
            Some(t) if t < 0 => len + t,
            Some(t) => t,
            None => {
                if step < 0 {
                    -1
                } else {
                    len
                }
            }
        };

        if from < 0 || from >= len || to < -1 || to > len {
            return Err(RuntimeError::BadIndex {
                bank: "audio samples".into(),
                index: from.max(to).max(0) as usize,
                size: len as usize,
            });
        }

        let step = if step == 0 {
            if from < to {
                1
            } else {
                -1
            }
        } else {
            step
        };

        let mut indices = Vec::new();
        if step > 0 {
            to = to.min(len);
            let mut i = from;
            while i < to {
                indices.push(i as usize);
                i += step;
            }
        } else {
            let mut i = from;
            while i > to {
                indices.push(i as usize);
                i += step;
            }
        }

        Ok(AudioData {
            spec: self.spec,
            data: self.data.slice_indices(&indices),
        })
    }

    /// Append another clip in place. Empty operands degrade to copies;
    /// spec mismatches fail with `BadFormat`.
    pub fn append(&mut self, rhs: &AudioData) -> RuntimeResult<()> {
        if self.sample_count() == 0 {
            *self = rhs.clone();
            return Ok(());
        }
        if rhs.sample_count() == 0 {
            return Ok(());
        }
        if self.spec != rhs.spec {
            return Err(RuntimeError::BadFormat(
                "cannot append audio with a different spec".into(),
            ));
        }
        self.data.extend_from(&rhs.data)
    }

    /// Concatenate clips. All inputs must share one spec and format.
    pub fn concat<'a>(clips: impl IntoIterator<Item = &'a AudioData>) -> RuntimeResult<AudioData> {
        let mut iter = clips.into_iter();
        let first = iter.next().ok_or_else(|| {
            RuntimeError::BadFormat("concat requires at least one audio clip".into())
        })?;
        let mut out = first.clone();
        for clip in iter {
            if clip.spec != out.spec {
                return Err(RuntimeError::BadFormat(
                    "all audio clips must share one spec".into(),
                ));
            }
            out.data.extend_from(&clip.data)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> AudioSpec {
        AudioSpec {
            sample_rate: 44_100,
            channels: 1,
            format: SampleFormat::S16,
        }
    }

    fn clip(samples: &[i16]) -> AudioData {
        AudioData {
            spec: spec(),
            data: SampleBuffer::S16(samples.to_vec()),
        }
    }

    fn samples(data: &AudioData) -> Vec<i16> {
        match &data.data {
            SampleBuffer::S16(v) => v.clone(),
            other => panic!("unexpected buffer {other:?}"),
        }
    }

    #[test]
    fn negative_from_wraps_from_the_end() {
        let clip = clip(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let tail = clip.slice(-3, None, 1).unwrap();
        assert_eq!(samples(&tail), vec![5, 6, 7]);
    }

    #[test]
    fn positive_step_strides_forward() {
        let clip = clip(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let strided = clip.slice(0, Some(8), 2).unwrap();
        assert_eq!(samples(&strided), vec![0, 2, 4, 6]);
    }

    #[test]
    fn negative_step_strides_backward_exclusive() {
        let clip = clip(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let reversed = clip.slice(7, Some(0), -2).unwrap();
        assert_eq!(samples(&reversed), vec![7, 5, 3, 1]);
    }

    #[test]
    fn zero_step_picks_direction_from_bounds() {
        let clip = clip(&[0, 1, 2, 3]);
        assert_eq!(samples(&clip.slice(0, Some(3), 0).unwrap()), vec![0, 1, 2]);
        assert_eq!(samples(&clip.slice(3, Some(0), 0).unwrap()), vec![3, 2, 1]);
    }

    #[test]
    fn out_of_range_from_is_an_error(){
        let clip = clip(&[0, 1, 2]);
        assert!(clip.slice(3, None, 1).is_err());
        assert!(clip.slice(-4, None, 1).is_err());
    }

    #[test]
    fn concat_with_matching_specs() {
        let a = clip(&[1, 2]);
        let b = clip(&[3]);
        let joined = AudioData::concat([&a, &b]).unwrap();
        assert_eq!(samples(&joined), vec![1, 2, 3]);
    }

    #[test]
    fn concat_rejects_mismatched_specs() {
        let a = clip(&[1, 2]);
        let mut b = clip(&[3]);
        b.spec.sample_rate = 22_050;
        assert!(matches!(
            AudioData::concat([&a, &b]),
            Err(RuntimeError::BadFormat(_))
        ));
    }

    #[test]
    fn append_into_empty_copies_spec() {
        let mut empty = AudioData::empty(spec());
        let b = clip(&[9, 8]);
        empty.append(&b).unwrap();
        assert_eq!(samples(&empty), vec![9, 8]);

        // Appending empty is a no-op.
        let before = empty.clone();
        empty.append(&AudioData::empty(spec())).unwrap();
        assert_eq!(empty, before);
    }

    #[test]
    fn byte_length_scales_with_format() {
        let clip = clip(&[1, 2, 3]);
        assert_eq!(clip.byte_length(), 6);
    }
}
