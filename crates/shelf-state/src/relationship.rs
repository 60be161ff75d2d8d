//! Work/creator cross-references.
//!
//! Works list their creators and creators list their works. Every helper
//! here edits both sides in one step so the two stores never disagree.

use shelf_model::{Creator, CreatorId, Work, WorkId};

use crate::error::StateError;
use crate::store::KeyedStore;

/// Add the pair on both sides. Returns false if both sides already had it.
pub fn link(
    works: &mut KeyedStore<Work>,
    creators: &mut KeyedStore<Creator>,
    work: WorkId,
    creator: CreatorId,
) -> Result<bool, StateError> {
    creators.get(creator)?;
    let added_to_work = works.update(work, |w| w.add_creator(creator))?;
    let added_to_creator = creators.update(creator, |c| c.add_work(work))?;
    Ok(added_to_work || added_to_creator)
}

/// Remove the pair from both sides. Returns false if neither side had it.
pub fn unlink(
    works: &mut KeyedStore<Work>,
    creators: &mut KeyedStore<Creator>,
    work: WorkId,
    creator: CreatorId,
) -> Result<bool, StateError> {
    creators.get(creator)?;
    let removed_from_work = works.update(work, |w| w.remove_creator(creator))?;
    let removed_from_creator = creators.update(creator, |c| c.remove_work(work))?;
    Ok(removed_from_work || removed_from_creator)
}

/// True if the pair is recorded on both sides.
pub fn is_linked(
    works: &KeyedStore<Work>,
    creators: &KeyedStore<Creator>,
    work: WorkId,
    creator: CreatorId,
) -> bool {
    works.find(work).is_some_and(|w| w.has_creator(creator))
        && creators.find(creator).is_some_and(|c| c.has_work(work))
}

/// Drop `work` from every creator it lists and clear its own list.
/// Returns the creators that were detached.
pub fn sever_work(
    works: &mut KeyedStore<Work>,
    creators: &mut KeyedStore<Creator>,
    work: WorkId,
) -> Result<Vec<CreatorId>, StateError> {
    let related = works.update(work, |w| std::mem::take(&mut w.creators))?;
    for creator in &related {
        // A miss is logged by the store; keep cleaning the remaining creators.
        let _ = creators.update(*creator, |c| c.remove_work(work));
    }
    Ok(related)
}

/// Drop `creator` from every work it lists and clear its own list.
pub fn sever_creator(
    works: &mut KeyedStore<Work>,
    creators: &mut KeyedStore<Creator>,
    creator: CreatorId,
) -> Result<Vec<WorkId>, StateError> {
    let related = creators.update(creator, |c| std::mem::take(&mut c.works))?;
    for work in &related {
        let _ = works.update(*work, |w| w.remove_creator(creator));
    }
    Ok(related)
}

/// Every pair recorded on one side only.
pub fn audit(works: &KeyedStore<Work>, creators: &KeyedStore<Creator>) -> Vec<(WorkId, CreatorId)> {
    let mut broken = Vec::new();
    for work in works.iter() {
        for creator in &work.creators {
            if !creators.find(*creator).is_some_and(|c| c.has_work(work.id)) {
                broken.push((work.id, *creator));
            }
        }
    }
    for creator in creators.iter() {
        for work in &creator.works {
            if !works.find(*work).is_some_and(|w| w.has_creator(creator.id)) {
                broken.push((*work, creator.id));
            }
        }
    }
    broken.sort();
    broken.dedup();
    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_model::{FormatId, StatusId, WorkTypeId};

    fn stores() -> (KeyedStore<Work>, KeyedStore<Creator>) {
        let mut works = KeyedStore::default();
        let mut creators = KeyedStore::default();
        works.replace(
            (1..=2)
                .map(|id| {
                    let mut work =
                        Work::draft(format!("w{id}"), "", StatusId(1), WorkTypeId(1), FormatId(1));
                    work.id = WorkId(id);
                    work
                })
                .collect(),
        );
        creators.replace(
            (1..=2)
                .map(|id| {
                    let mut creator = Creator::draft(format!("c{id}"));
                    creator.id = CreatorId(id);
                    creator
                })
                .collect(),
        );
        (works, creators)
    }

    #[test]
    fn test_link_is_idempotent() {
        let (mut works, mut creators) = stores();
        assert!(link(&mut works, &mut creators, WorkId(1), CreatorId(2)).unwrap());
        assert!(!link(&mut works, &mut creators, WorkId(1), CreatorId(2)).unwrap());
        assert_eq!(works.get(WorkId(1)).unwrap().creators, vec![CreatorId(2)]);
        assert_eq!(creators.get(CreatorId(2)).unwrap().works, vec![WorkId(1)]);
        assert!(audit(&works, &creators).is_empty());
    }

    #[test]
    fn test_link_missing_creator_leaves_work_untouched() {
        let (mut works, mut creators) = stores();
        assert!(link(&mut works, &mut creators, WorkId(1), CreatorId(9)).is_err());
        assert!(works.get(WorkId(1)).unwrap().creators.is_empty());
    }

    #[test]
    fn test_sever_work_cleans_creators() {
        let (mut works, mut creators) = stores();
        link(&mut works, &mut creators, WorkId(1), CreatorId(1)).unwrap();
        link(&mut works, &mut creators, WorkId(1), CreatorId(2)).unwrap();
        let detached = sever_work(&mut works, &mut creators, WorkId(1)).unwrap();
        assert_eq!(detached, vec![CreatorId(1), CreatorId(2)]);
        assert!(creators.iter().all(|c| c.works.is_empty()));
        assert!(audit(&works, &creators).is_empty());
    }

    #[test]
    fn test_audit_reports_one_sided_pairs() {
        let (mut works, creators) = stores();
        works.update(WorkId(2), |w| w.add_creator(CreatorId(1))).unwrap();
        assert_eq!(audit(&works, &creators), vec![(WorkId(2), CreatorId(1))]);
    }
}
