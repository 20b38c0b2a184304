use std::{
    cell::RefCell,
    sync::mpsc::{channel, Receiver, Sender},
};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::error::{FreezeOutError, Result};

use super::field::{empty_layer, FieldCell, FieldStore, Halo, Layer, SHEAR};

const REDUCE_TAG: u32 = 100;
const BROADCAST_TAG: u32 = 101;
const ABORT_TAG: u32 = 102;

/// Field sent across a rank boundary. The tag identifies the packet on the
/// wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Energy,
    EnergyPrev,
    U(usize),
    Rhob,
    UPrev(usize),
    Shear(usize),
    ShearPrev(usize),
    Bulk,
    BulkPrev,
}

impl Field {
    /// All exchanged fields in tag order.
    pub fn all() -> Vec<Field> {
        let mut fields = vec![Field::Energy, Field::EnergyPrev];
        fields.extend((0..4).map(Field::U));
        fields.push(Field::Rhob);
        fields.extend((0..4).map(Field::UPrev));
        fields.extend((0..SHEAR).map(Field::Shear));
        fields.extend((0..SHEAR).map(Field::ShearPrev));
        fields.extend([Field::Bulk, Field::BulkPrev]);
        fields
    }

    pub fn tag(&self) -> u32 {
        match *self {
            Field::Energy => 1,
            Field::EnergyPrev => 2,
            Field::U(i) => 3 + i as u32,
            Field::Rhob => 7,
            Field::UPrev(i) => 8 + i as u32,
            Field::Shear(i) => 12 + i as u32,
            Field::ShearPrev(i) => 22 + i as u32,
            Field::Bulk => 32,
            Field::BulkPrev => 33,
        }
    }

    fn get(&self, c: &FieldCell) -> f64 {
        match *self {
            Field::Energy => c.e,
            Field::EnergyPrev => c.e_prev,
            Field::U(i) => c.u[i],
            Field::Rhob => c.rhob,
            Field::UPrev(i) => c.u_prev[i],
            Field::Shear(i) => c.pi[i],
            Field::ShearPrev(i) => c.pi_prev[i],
            Field::Bulk => c.bulk,
            Field::BulkPrev => c.bulk_prev,
        }
    }

    fn set(&self, c: &mut FieldCell, v: f64) {
        match *self {
            Field::Energy => c.e = v,
            Field::EnergyPrev => c.e_prev = v,
            Field::U(i) => c.u[i] = v,
            Field::Rhob => c.rhob = v,
            Field::UPrev(i) => c.u_prev[i] = v,
            Field::Shear(i) => c.pi[i] = v,
            Field::ShearPrev(i) => c.pi_prev[i] = v,
            Field::Bulk => c.bulk = v,
            Field::BulkPrev => c.bulk_prev = v,
        }
    }
}

/// Point-to-point and collective operations between ranks of the eta
/// decomposition. All calls block.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn send(&self, to: usize, tag: u32, payload: Vec<u8>) -> Result<()>;
    fn recv(&self, from: usize, tag: u32) -> Result<Vec<u8>>;

    /// Tells every other rank that this one stopped on an error, so that
    /// their pending and later receives fail instead of blocking.
    fn abort(&self) {}

    /// Sum over all ranks, gathered on rank 0 and broadcast back.
    fn all_reduce_sum(&self, value: u64) -> Result<u64> {
        let rank = self.rank();
        if rank == 0 {
            let mut total = value;
            for from in 1..self.size() {
                total += decode_u64(rank, &self.recv(from, REDUCE_TAG)?)?;
            }
            for to in 1..self.size() {
                self.send(to, BROADCAST_TAG, total.to_le_bytes().to_vec())?;
            }
            Ok(total)
        } else {
            self.send(0, REDUCE_TAG, value.to_le_bytes().to_vec())?;
            decode_u64(rank, &self.recv(0, BROADCAST_TAG)?)
        }
    }
}

fn decode_u64(rank: usize, bytes: &[u8]) -> Result<u64> {
    if bytes.len() != 8 {
        return Err(FreezeOutError::Exchange {
            rank,
            reason: format!("reduction packet of {} bytes", bytes.len()),
        });
    }
    Ok(LittleEndian::read_u64(bytes))
}

/// The whole lattice lives in one process.
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, to: usize, tag: u32, _payload: Vec<u8>) -> Result<()> {
        Err(FreezeOutError::Exchange {
            rank: 0,
            reason: format!("cannot send tag {tag} to rank {to} in a single process"),
        })
    }

    fn recv(&self, from: usize, tag: u32) -> Result<Vec<u8>> {
        Err(FreezeOutError::Exchange {
            rank: 0,
            reason: format!("cannot receive tag {tag} from rank {from} in a single process"),
        })
    }
}

struct Packet {
    from: usize,
    tag: u32,
    payload: Vec<u8>,
}

/// Ranks running as threads of one process, connected by channels.
pub struct ThreadRanks {
    rank: usize,
    peers: Vec<Option<Sender<Packet>>>,
    inbox: Receiver<Packet>,
    pending: RefCell<Vec<Packet>>,
}

impl ThreadRanks {
    /// One endpoint per rank; move each into its own thread.
    pub fn mesh(size: usize) -> Vec<ThreadRanks> {
        let (senders, receivers): (Vec<Sender<Packet>>, Vec<Receiver<Packet>>) =
            (0..size).map(|_| channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadRanks {
                rank,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(i, s)| if i == rank { None } else { Some(s.clone()) })
                    .collect(),
                inbox,
                pending: RefCell::new(vec![]),
            })
            .collect()
    }

    fn error(&self, reason: String) -> FreezeOutError {
        FreezeOutError::Exchange {
            rank: self.rank,
            reason,
        }
    }

    fn aborted(&self, from: usize) -> FreezeOutError {
        self.error(format!("rank {from} aborted"))
    }
}

impl Communicator for ThreadRanks {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, to: usize, tag: u32, payload: Vec<u8>) -> Result<()> {
        let peer = self
            .peers
            .get(to)
            .and_then(|p| p.as_ref())
            .ok_or_else(|| self.error(format!("no peer rank {to}")))?;
        peer.send(Packet {
            from: self.rank,
            tag,
            payload,
        })
        .map_err(|_| self.error(format!("rank {to} hung up")))
    }

    fn recv(&self, from: usize, tag: u32) -> Result<Vec<u8>> {
        let mut pending = self.pending.borrow_mut();
        if let Some(p) = pending.iter().find(|p| p.tag == ABORT_TAG) {
            return Err(self.aborted(p.from));
        }
        if let Some(i) = pending.iter().position(|p| p.from == from && p.tag == tag) {
            return Ok(pending.remove(i).payload);
        }
        loop {
            let packet = self
                .inbox
                .recv()
                .map_err(|_| self.error(format!("waiting for tag {tag} from rank {from}")))?;
            if packet.tag == ABORT_TAG {
                let err = self.aborted(packet.from);
                pending.push(packet);
                return Err(err);
            }
            if packet.from == from && packet.tag == tag {
                return Ok(packet.payload);
            }
            pending.push(packet);
        }
    }

    fn abort(&self) {
        debug!("rank {} aborts", self.rank);
        for peer in self.peers.iter().flatten() {
            // a peer that already hung up needs no notice
            let _ = peer.send(Packet {
                from: self.rank,
                tag: ABORT_TAG,
                payload: vec![],
            });
        }
    }
}

fn encode_layer<const VX: usize, const VY: usize>(layer: &Layer<VX, VY>, field: Field) -> Vec<u8> {
    let mut values = vec![0.0f64; VX * VY];
    for iy in 0..VY {
        for ix in 0..VX {
            values[ix + VX * iy] = field.get(&layer[iy][ix]);
        }
    }
    let mut bytes = vec![0u8; 8 * VX * VY];
    LittleEndian::write_f64_into(&values, &mut bytes);
    bytes
}

fn decode_layer<const VX: usize, const VY: usize>(
    rank: usize,
    bytes: &[u8],
    field: Field,
    layer: &mut Layer<VX, VY>,
) -> Result<()> {
    if bytes.len() != 8 * VX * VY {
        return Err(FreezeOutError::Exchange {
            rank,
            reason: format!(
                "field tag {} carries {} bytes, expected {}",
                field.tag(),
                bytes.len(),
                8 * VX * VY
            ),
        });
    }
    let mut values = vec![0.0f64; VX * VY];
    LittleEndian::read_f64_into(bytes, &mut values);
    for iy in 0..VY {
        for ix in 0..VX {
            field.set(&mut layer[iy][ix], values[ix + VX * iy]);
        }
    }
    Ok(())
}

/// Sends the first eta layer to the left neighbour and receives the right
/// neighbour's. The last rank has no right neighbour and gets `None`.
pub fn exchange_boundary<C, const VX: usize, const VY: usize, const VZ: usize>(
    store: &FieldStore<VX, VY, VZ>,
    comm: &C,
) -> Result<Option<Halo<VX, VY>>>
where
    C: Communicator + ?Sized,
{
    let (rank, size) = (comm.rank(), comm.size());
    let fields = Field::all();
    if rank != 0 {
        let layer = store.layer(0);
        for field in fields.iter() {
            comm.send(rank - 1, field.tag(), encode_layer(layer, *field))?;
        }
    }
    if rank + 1 < size {
        let mut halo = empty_layer::<VX, VY>();
        for field in fields.iter() {
            let bytes = comm.recv(rank + 1, field.tag())?;
            decode_layer(rank, &bytes, *field, &mut halo)?;
        }
        debug!("rank {} received the halo of rank {}", rank, rank + 1);
        Ok(Some(halo))
    } else {
        Ok(None)
    }
}

/// True when no rank found any intersecting hypercube.
pub fn all_frozen<C: Communicator + ?Sized>(comm: &C, intersections: usize) -> Result<bool> {
    Ok(comm.all_reduce_sum(intersections as u64)? == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn tags_cover_one_to_thirty_three() {
        let tags: Vec<u32> = Field::all().iter().map(|f| f.tag()).collect();
        assert_eq!(tags, (1..=33).collect::<Vec<u32>>());
    }

    #[test]
    fn single_process_has_no_halo() {
        let store = FieldStore::<3, 3, 2>::new(1.0, 0.1, 0);
        assert!(exchange_boundary(&store, &SingleProcess).unwrap().is_none());
        assert!(all_frozen(&SingleProcess, 0).unwrap());
        assert!(!all_frozen(&SingleProcess, 3).unwrap());
    }

    #[test]
    fn halo_comes_from_the_right_neighbour() {
        let handles: Vec<_> = ThreadRanks::mesh(3)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let rank = comm.rank();
                    let mut store = FieldStore::<3, 2, 2>::new(1.0, 0.1, rank);
                    store.fill(|ix, iy, ieta| {
                        let mut c = FieldCell::at_rest(
                            (100 * rank + 10 * ieta + ix + 3 * iy) as f64,
                            -(rank as f64),
                        );
                        c.pi[9] = ix as f64;
                        c.bulk_prev = iy as f64;
                        c
                    });
                    let halo = exchange_boundary(&store, &comm).unwrap();
                    let frozen = all_frozen(&comm, rank).unwrap();
                    (rank, halo, frozen)
                })
            })
            .collect();
        for h in handles {
            let (rank, halo, frozen) = h.join().unwrap();
            assert!(!frozen);
            if rank == 2 {
                assert!(halo.is_none());
                continue;
            }
            let halo = halo.unwrap();
            let right = rank + 1;
            for iy in 0..2 {
                for ix in 0..3 {
                    let c = &halo[iy][ix];
                    assert_eq!(c.e, (100 * right + ix + 3 * iy) as f64);
                    assert_eq!(c.e_prev, -(right as f64));
                    assert_eq!(c.u, [1.0, 0.0, 0.0, 0.0]);
                    assert_eq!(c.pi[9], ix as f64);
                    assert_eq!(c.bulk_prev, iy as f64);
                }
            }
        }
    }

    #[test]
    fn abort_releases_waiting_ranks() {
        let handles: Vec<_> = ThreadRanks::mesh(3)
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    if comm.rank() == 1 {
                        comm.abort();
                        return (1, None);
                    }
                    let res = all_frozen(&comm, 1);
                    // later calls fail as well
                    let again = comm.recv(1, REDUCE_TAG);
                    assert!(again.is_err());
                    (comm.rank(), Some(res))
                })
            })
            .collect();
        for h in handles {
            let (rank, res) = h.join().unwrap();
            if rank == 1 {
                continue;
            }
            assert!(matches!(
                res,
                Some(Err(FreezeOutError::Exchange { rank: r, .. })) if r == rank
            ));
        }
    }

    #[test]
    fn short_packet_is_an_error() {
        let mut layer = *empty_layer::<2, 2>();
        let err = decode_layer(1, &[0u8; 8], Field::Energy, &mut layer).unwrap_err();
        assert!(matches!(err, FreezeOutError::Exchange { rank: 1, .. }));
    }
}
