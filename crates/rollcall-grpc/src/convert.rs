//! Conversions between wire messages and directory records.

use rollcall::PersonRecord;

use crate::proto;

impl From<proto::Person> for PersonRecord {
    fn from(person: proto::Person) -> Self {
        PersonRecord {
            name: person.name,
            id: person.id,
            email: person.email,
        }
    }
}

impl From<PersonRecord> for proto::Person {
    fn from(record: PersonRecord) -> Self {
        proto::Person {
            name: record.name,
            id: record.id,
            email: record.email,
        }
    }
}
