use super::enums::ResponseCode;
use super::header::{DNSHeader, HEADER_SIZE};
use super::question::DNSQuestion;
use super::resource::DNSResource;
use crate::error::{DnsError, Result};

/// A parsed DNS message. In an UPDATE message (opcode 5) the sections are
/// reinterpreted per RFC 2136: questions = zone, answers = prerequisites,
/// authorities = update records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
}

impl DNSPacket {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = DNSHeader::parse(data)?;
        let mut pos = HEADER_SIZE;

        let mut questions = Vec::with_capacity(header.qdcount as usize);
        for _ in 0..header.qdcount {
            let (question, next) = DNSQuestion::parse(data, pos)?;
            questions.push(question);
            pos = next;
        }

        let mut sections = [
            Vec::with_capacity(header.ancount as usize),
            Vec::with_capacity(header.nscount as usize),
            Vec::with_capacity(header.arcount as usize),
        ];
        for (section, count) in sections
            .iter_mut()
            .zip([header.ancount, header.nscount, header.arcount])
        {
            for _ in 0..count {
                let (record, next) = DNSResource::parse(data, pos)?;
                section.push(record);
                pos = next;
            }
        }

        let [answers, authorities, resources] = sections;
        Ok(Self {
            header,
            questions,
            answers,
            authorities,
            resources,
        })
    }

    /// Serialize without name compression. Counts are taken from the
    /// section lengths, not the stored header counts.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authorities.len() as u16;
        header.arcount = self.resources.len() as u16;

        let mut buf = Vec::with_capacity(512);
        header.write(&mut buf);
        for question in &self.questions {
            question.write(&mut buf)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.resources)
        {
            record.write(&mut buf)?;
        }
        Ok(buf)
    }

    /// Build a fresh query for (name, type) with a caller-chosen id.
    pub fn query(id: u16, question: DNSQuestion) -> Self {
        Self {
            header: DNSHeader {
                id,
                rd: true,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![question],
            ..Default::default()
        }
    }

    /// Start an authoritative response to `query`: same id, question echoed,
    /// empty sections.
    pub fn response_to(query: &Self) -> Self {
        Self {
            header: DNSHeader {
                id: query.header.id,
                qr: true,
                opcode: query.header.opcode,
                aa: true,
                rd: query.header.rd,
                rcode: ResponseCode::NoError as u8,
                ..Default::default()
            },
            questions: query.questions.clone(),
            ..Default::default()
        }
    }

    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode as u8;
    }

    /// True when this message carries an RFC 2136 update section.
    pub fn is_update(&self) -> bool {
        self.header.opcode == super::enums::opcode::UPDATE && !self.authorities.is_empty()
    }

    pub fn first_question(&self) -> Result<&DNSQuestion> {
        self.questions
            .first()
            .ok_or_else(|| DnsError::InvalidPacket("empty question section".to_string()))
    }
}
