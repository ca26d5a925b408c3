//! In-memory stand-in for a VDR answering SVDRP.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use crate::channel::ChannelDirectory;

/// `WCVB` is an ATSC channel identified by frequency, `WHDH` a DVB-T channel with
/// network and transport IDs.
pub fn directory() -> ChannelDirectory {
    ChannelDirectory::parse(
        "ABC,WCVB;Hearst:509028:M10:A:0:49=2:52:0:0:3:0:0:0\n\
         NBC,WHDH;Sunbeam:514000:B8C23D12M64:T:27500:101=2:102:0:0:769:8468:514:0\n",
    )
}

pub struct FakeVdr {
    pub greeting: String,
    /// Command answered with an error instead of its usual reply.
    pub reject: Option<String>,
}

impl Default for FakeVdr {
    fn default() -> Self {
        Self {
            greeting: "220 vdr SVDRP VideoDiskRecorder 2.6.4; Sat Oct 17 12:00:00 2026; UTF-8"
                .to_string(),
            reject: None,
        }
    }
}

impl FakeVdr {
    /// Serves one connection and returns every line received from the client.
    pub async fn serve(self, stream: DuplexStream) -> Vec<String> {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut received = Vec::new();
        let mut in_block = false;

        if writer
            .write_all(format!("{}\r\n", self.greeting).as_bytes())
            .await
            .is_err()
        {
            return received;
        }

        while let Ok(Some(line)) = lines.next_line().await {
            received.push(line.clone());

            let reply = if self.reject.as_deref() == Some(line.as_str()) {
                Some("554 Transaction failed")
            } else if in_block {
                if line == "." {
                    in_block = false;
                    Some("250 EPG data processed")
                } else {
                    None
                }
            } else {
                match line.as_str() {
                    "CLRE" => Some("250 EPG data cleared"),
                    "PUTE" => {
                        in_block = true;
                        Some("354 Enter EPG data, end with \".\" on a line by itself")
                    }
                    "QUIT" => Some("221 vdr closing connection"),
                    _ => Some("500 Command unrecognized"),
                }
            };

            if let Some(reply) = reply {
                if writer
                    .write_all(format!("{reply}\r\n").as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
            }

            if line == "QUIT" && !in_block {
                break;
            }
        }

        received
    }
}
